//! Authenticated request gateway for the marketplace backend: bearer-token injection, transparent
//! single-flight refresh, and a strict retry-once policy for every outbound REST call.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod obs;
pub mod transport;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::GatewayConfig,
		events::{SessionEvent, SessionListener},
		gateway::ReqwestGateway,
	};

	/// Builds a gateway pointed at `base_url` using the default reqwest transport.
	pub fn build_reqwest_test_gateway(base_url: &str) -> ReqwestGateway {
		let config = GatewayConfig::builder(
			Url::parse(base_url).expect("Test base URL should parse successfully."),
		)
		.build()
		.expect("Test gateway configuration should validate.");

		ReqwestGateway::new(config).expect("Failed to build reqwest gateway for tests.")
	}

	/// Listener that records every [`SessionEvent`] it observes.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingListener(Arc<Mutex<Vec<SessionEvent>>>);
	impl RecordingListener {
		/// Returns a copy of the recorded events.
		pub fn events(&self) -> Vec<SessionEvent> {
			self.0.lock().clone()
		}
	}
	impl SessionListener for RecordingListener {
		fn on_event(&self, event: &SessionEvent) {
			self.0.lock().push(event.clone());
		}
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
