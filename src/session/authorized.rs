//! Bearer-attaching wrapper for resource calls with a single refresh-and-retry on 401.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	http::{ApiRequest, ApiResponse, HttpTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionManager,
};

impl<T> SessionManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sends `request` with the current access token attached.
	///
	/// A 401 triggers one refresh and, if it succeeds, one re-send with the new token. The
	/// re-sent call's outcome is returned as is; it is never retried again. A failed refresh
	/// surfaces as [`Error::RefreshFailed`]; a refresh that succeeded but left no session
	/// (for example after the profile step logged out) surfaces the original 401.
	///
	/// Without a session the request goes out with no `Authorization` header.
	pub async fn send_authorized(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::AuthorizedCall;

		let span = FlowSpan::new(KIND, "send_authorized");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_authorized_inner(request)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// `GET`s `path` (relative to the base URL) and decodes the JSON body.
	pub async fn get_json<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let request = ApiRequest::get(self.config.resolve(path)?);

		Ok(self.send_authorized(request).await?.json()?)
	}

	/// `POST`s `body` as JSON to `path` (relative to the base URL) and decodes the reply.
	pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize + Sync,
		R: DeserializeOwned,
	{
		let request = ApiRequest::post(self.config.resolve(path)?).json(body)?;

		Ok(self.send_authorized(request).await?.json()?)
	}

	async fn send_authorized_inner(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		let Some((generation, subject, access)) = self.bearer() else {
			request.strip_authorization();

			return Ok(self.transport.execute(request).await?.into_success()?);
		};
		let first = self.transport.execute(request.clone().with_bearer(&access)).await?;

		if !first.is_unauthorized() {
			return Ok(first.into_success()?);
		}
		if let Err(e) = self.refresh_since(generation, Some(&subject)).await {
			return Err(match e {
				Error::RefreshFailed { .. } => e,
				_ => first.status_error().into(),
			});
		}

		let Some((_, _, access)) = self.bearer() else {
			return Err(first.status_error().into());
		};

		self.metrics.record_authorized_retry();

		Ok(self.transport.execute(request.with_bearer(&access)).await?.into_success()?)
	}
}
