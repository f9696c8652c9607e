//! Typed paths for the marketplace REST resources.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	auth::IdempotencyKey,
	gateway::{Gateway, RequestOptions},
	transport::HttpTransport,
};

/// Auction collection path.
pub const AUCTIONS_PATH: &str = "/auctions";
/// Detailed cart items path.
pub const CART_ITEMS_DETAILED_PATH: &str = "/carts/items/detailed";
/// Cart items path.
pub const CART_ITEMS_PATH: &str = "/carts/items";
/// Inventory path.
pub const INVENTORY_PATH: &str = "/inventory";
/// Product collection path.
pub const PRODUCTS_PATH: &str = "/products";
/// Ratings path.
pub const RATINGS_PATH: &str = "/ratings";
/// Current user path.
pub const CURRENT_USER_PATH: &str = "/users/me";

/// Borrowed handle exposing resource helpers for a gateway.
#[derive(Debug)]
pub struct Resources<'g, T>
where
	T: ?Sized + HttpTransport,
{
	gateway: &'g Gateway<T>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Returns the resource helpers for this gateway.
	pub fn resources(&self) -> Resources<'_, T> {
		Resources { gateway: self }
	}
}
impl<T> Resources<'_, T>
where
	T: ?Sized + HttpTransport,
{
	/// `GET /auctions/{id}`.
	pub async fn auction<R>(&self, id: u64) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.gateway.get(&format!("{AUCTIONS_PATH}/{id}")).await
	}

	/// `GET /auctions` with optional query pairs (filters, paging).
	pub async fn auctions<R>(&self, query: &[(&str, &str)]) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let options = query
			.iter()
			.fold(RequestOptions::default(), |options, (key, value)| options.with_query(*key, *value));

		self.gateway.request::<(), R>(Method::GET, AUCTIONS_PATH, None, options).await
	}

	/// `POST /auctions` creating an auction or fixed-price listing.
	pub async fn create_auction<B, R>(&self, listing: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.gateway.post(AUCTIONS_PATH, listing).await
	}

	/// `GET /carts/items/detailed`.
	pub async fn cart_items_detailed<R>(&self) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.gateway.get(CART_ITEMS_DETAILED_PATH).await
	}

	/// `POST /carts/items`.
	pub async fn add_cart_item<B, R>(&self, item: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.gateway.post(CART_ITEMS_PATH, item).await
	}

	/// `DELETE /carts/items/{id}`.
	pub async fn remove_cart_item<R>(&self, id: u64) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.gateway.delete(&format!("{CART_ITEMS_PATH}/{id}")).await
	}

	/// `GET /inventory`.
	pub async fn inventory<R>(&self) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.gateway.get(INVENTORY_PATH).await
	}

	/// `GET /products/{id}`.
	pub async fn product<R>(&self, id: u64) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.gateway.get(&format!("{PRODUCTS_PATH}/{id}")).await
	}

	/// `POST /products` guarded by a caller-supplied idempotency key.
	pub async fn create_product<B, R>(&self, product: &B, key: IdempotencyKey) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.idempotent_post(PRODUCTS_PATH, product, key).await
	}

	/// `POST /ratings` guarded by a caller-supplied idempotency key.
	pub async fn create_rating<B, R>(&self, rating: &B, key: IdempotencyKey) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.idempotent_post(RATINGS_PATH, rating, key).await
	}

	/// `GET /users/me`.
	pub async fn current_user<R>(&self) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.gateway.get(CURRENT_USER_PATH).await
	}

	async fn idempotent_post<B, R>(&self, path: &str, body: &B, key: IdempotencyKey) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.gateway
			.request(Method::POST, path, Some(body), RequestOptions::default().with_idempotency_key(key))
			.await
	}
}
