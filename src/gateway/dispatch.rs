//! Request dispatch: bearer injection and the 401 -> refresh -> retry-once cycle.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	error::AuthExpiredError,
	gateway::{Gateway, RequestEnvelope, RequestOptions},
	obs::{self, CallOutcome, CallSpan, CallStage},
	transport::{HttpTransport, TransportResponse},
};

/// Next step of a request once its response has been observed.
#[derive(Debug)]
pub(crate) enum Transition {
	/// 2xx; hand the payload to the caller.
	Succeeded,
	/// 401 on the first attempt; refresh and retry once.
	Refresh,
	/// Terminal failure surfaced unchanged.
	Failed(Error),
}

pub(crate) fn transition(envelope: &RequestEnvelope, response: &TransportResponse) -> Transition {
	if response.is_success() {
		return Transition::Succeeded;
	}

	let rejection = response.to_request_error();

	if !response.is_unauthorized() || !envelope.is_session_bound() {
		return Transition::Failed(rejection.into());
	}
	if envelope.refreshable() {
		Transition::Refresh
	} else {
		Transition::Failed(AuthExpiredError::RetryRejected(rejection).into())
	}
}

impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Issues `method path` with an optional JSON body and returns the decoded 2xx payload.
	///
	/// Non-401 rejections fail with [`Error::Request`]. A 401 triggers one refresh and one
	/// retry; see [`Gateway::execute`].
	pub async fn request<B, R>(
		&self,
		method: Method,
		path: &str,
		body: Option<&B>,
		options: RequestOptions,
	) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		let envelope = RequestEnvelope::new(method, path, body, options)?;
		let response = self.execute(envelope).await?;

		Ok(response.json()?)
	}

	/// `GET path`.
	pub async fn get<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request::<(), R>(Method::GET, path, None, RequestOptions::default()).await
	}

	/// `POST path` with a JSON body.
	pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request(Method::POST, path, Some(body), RequestOptions::default()).await
	}

	/// `PUT path` with a JSON body.
	pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request(Method::PUT, path, Some(body), RequestOptions::default()).await
	}

	/// `PATCH path` with a JSON body.
	pub async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request(Method::PATCH, path, Some(body), RequestOptions::default()).await
	}

	/// `DELETE path`.
	pub async fn delete<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request::<(), R>(Method::DELETE, path, None, RequestOptions::default()).await
	}

	/// Drives an envelope through the authenticated lifecycle and returns the raw 2xx response.
	///
	/// - 2xx: succeeded.
	/// - 401 on [`Attempt::Initial`](crate::gateway::Attempt::Initial): refresh, then retry once with the new token.
	/// - 401 on [`Attempt::Retried`](crate::gateway::Attempt::Retried): [`AuthExpiredError::RetryRejected`], no second refresh.
	/// - Any other status: [`Error::Request`]; transport failures: [`Error::Transport`].
	pub async fn execute(&self, envelope: RequestEnvelope) -> Result<TransportResponse> {
		const STAGE: CallStage = CallStage::Request;

		let span = CallSpan::new(STAGE, envelope.method().as_str(), envelope.path());

		self.metrics.record_request();
		obs::record_call_outcome(STAGE, CallOutcome::Attempt);

		let result = span.instrument(self.drive(envelope)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(STAGE, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(STAGE, CallOutcome::Failure),
		}

		result
	}

	async fn drive(&self, mut envelope: RequestEnvelope) -> Result<TransportResponse> {
		let sent = self.state.snapshot();
		let mut token = sent.token;

		loop {
			let request = envelope.to_transport(&self.config, token.as_ref())?;
			let response = self.transport.send(request).await?;

			match transition(&envelope, &response) {
				Transition::Succeeded => return Ok(response),
				Transition::Failed(err) => return Err(err),
				Transition::Refresh => {
					token = Some(self.recover(sent.epoch).await?);
					envelope = envelope.into_retry();

					self.metrics.record_retry();
					obs::record_call_outcome(CallStage::Retry, CallOutcome::Attempt);
				},
			}
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::StatusCode;
	// self
	use super::*;
	use crate::error::RequestError;

	fn response(status: StatusCode) -> TransportResponse {
		TransportResponse::new(status, br#"{"message":"nope"}"#.to_vec())
	}

	fn envelope(options: RequestOptions) -> RequestEnvelope {
		RequestEnvelope::new::<()>(Method::GET, "/auctions/5", None, options)
			.expect("Envelope should build.")
	}

	#[test]
	fn success_is_terminal_on_any_attempt() {
		assert!(matches!(
			transition(&envelope(Default::default()), &response(StatusCode::OK)),
			Transition::Succeeded
		));
		assert!(matches!(
			transition(&envelope(Default::default()).into_retry(), &response(StatusCode::CREATED)),
			Transition::Succeeded
		));
	}

	#[test]
	fn unauthorized_refreshes_only_once() {
		let initial = envelope(Default::default());

		assert!(matches!(
			transition(&initial, &response(StatusCode::UNAUTHORIZED)),
			Transition::Refresh
		));

		match transition(&initial.into_retry(), &response(StatusCode::UNAUTHORIZED)) {
			Transition::Failed(Error::AuthExpired(AuthExpiredError::RetryRejected(e))) =>
				assert_eq!(e, RequestError::new(401, "nope")),
			other => panic!("Unexpected transition: {other:?}."),
		}
	}

	#[test]
	fn other_statuses_fail_without_refresh() {
		for status in [StatusCode::FORBIDDEN, StatusCode::NOT_FOUND, StatusCode::BAD_GATEWAY] {
			match transition(&envelope(Default::default()), &response(status)) {
				Transition::Failed(Error::Request(e)) => assert_eq!(e.status, status.as_u16()),
				other => panic!("Unexpected transition for {status}: {other:?}."),
			}
		}
	}

	#[test]
	fn unauthorized_outside_the_session_is_a_plain_rejection() {
		for options in [RequestOptions::default().anonymous(), RequestOptions::default().skip_refresh()]
		{
			match transition(&envelope(options), &response(StatusCode::UNAUTHORIZED)) {
				Transition::Failed(Error::Request(e)) => assert_eq!(e.status, 401),
				other => panic!("Unexpected transition: {other:?}."),
			}
		}
	}
}
