//! Bearer-authorized request dispatch with per-endpoint supersession.
//!
//! [`Dispatcher::request`] resolves the stored session token, attaches it as an
//! `Authorization: Bearer` header, and sends the call through an [`HttpTransport`]. Requests
//! are deduplicated by [`RequestKey`] (`METHOD-endpoint`): issuing a request while another one
//! with the same key is outstanding aborts the older one, so only the most recent response for
//! a key is ever observed. Aborted callers receive [`Error::Cancelled`], which UI code treats
//! as a silent outcome. No retries, backoff, or queueing happen here.

pub mod key;
pub mod registry;

pub use key::*;
pub use registry::*;

// crates.io
use futures::future::Abortable;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::ApiConfig,
	error::{ConfigError, DecodeError},
	http::{HttpTransport, Method, MultipartForm, TransportBody, TransportRequest, TransportResponse},
	obs::{self, RequestOutcome, RequestSpan},
	session::SessionTokens,
	store::KeyValueStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const CONTENT_TYPE: &str = "content-type";
const AUTHORIZATION: &str = "authorization";
const JSON_MIME: &str = "application/json";

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport.
pub type ReqwestDispatcher = Dispatcher<ReqwestTransport>;

/// Request body accepted by the dispatcher.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// JSON document; sent with `Content-Type: application/json`.
	Json(Value),
	/// Multipart form; the transport sets the content type and boundary.
	Multipart(MultipartForm),
}

/// Per-call options: method, body, and extra headers.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// HTTP verb (defaults to `GET`).
	pub method: Method,
	/// Request body.
	pub body: RequestBody,
	/// Extra headers; these override the dispatcher defaults.
	pub headers: BTreeMap<String, String>,
}
impl RequestOptions {
	/// Creates options for `method` with an empty body.
	pub fn new(method: Method) -> Self {
		Self { method, ..Default::default() }
	}

	/// Shorthand for a `GET`.
	pub fn get() -> Self {
		Self::new(Method::Get)
	}

	/// Attaches a JSON body.
	pub fn json(mut self, value: Value) -> Self {
		self.body = RequestBody::Json(value);

		self
	}

	/// Serializes `value` into a JSON body.
	pub fn json_from<B>(self, value: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		let value = serde_json::to_value(value).map_err(ConfigError::BodySerialize)?;

		Ok(self.json(value))
	}

	/// Attaches a multipart body.
	pub fn multipart(mut self, form: MultipartForm) -> Self {
		self.body = RequestBody::Multipart(form);

		self
	}

	/// Adds or replaces a header; names are case-insensitive.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}
}

/// Issues backend calls with authorization and same-key supersession.
pub struct Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	config: ApiConfig,
	transport: Arc<T>,
	session: SessionTokens,
	in_flight: Arc<InFlightRegistry>,
}
impl<T> Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a dispatcher that reuses the caller-provided transport.
	pub fn with_transport(
		config: ApiConfig,
		store: Arc<dyn KeyValueStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let session = SessionTokens::new(store, config.token_key.clone());

		Self { config, transport: transport.into(), session, in_flight: Default::default() }
	}

	/// Configuration this dispatcher targets.
	pub fn config(&self) -> &ApiConfig {
		&self.config
	}

	/// Session token accessor bound to the configured storage key.
	pub fn session(&self) -> &SessionTokens {
		&self.session
	}

	/// Number of requests currently outstanding.
	pub fn in_flight(&self) -> usize {
		self.in_flight.len()
	}

	/// Sends a request and returns the interpreted response body.
	///
	/// JSON responses are parsed; anything else is wrapped as `{"text": <body>}`. Non-2xx
	/// statuses fail with [`Error::Api`] carrying the body's `error`/`message` field or a
	/// `Server error: <status>` fallback.
	pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value> {
		let key = RequestKey::new(options.method, endpoint);
		let span = RequestSpan::new(key.method(), key.endpoint());

		obs::record_request_outcome(key.method(), RequestOutcome::Attempt);

		let result = span.instrument(self.dispatch(&key, options)).await;
		let outcome = match &result {
			Ok(_) => RequestOutcome::Success,
			Err(e) if e.is_cancelled() => RequestOutcome::Cancelled,
			Err(_) => RequestOutcome::Failure,
		};

		obs::record_request_outcome(key.method(), outcome);

		result
	}

	/// Sends a request and deserializes the body into `R`.
	pub async fn request_as<R>(&self, endpoint: &str, options: RequestOptions) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let value = self.request(endpoint, options).await?;
		let decoded = serde_path_to_error::deserialize(value).map_err(DecodeError::from)?;

		Ok(decoded)
	}

	/// `GET endpoint`.
	pub async fn get(&self, endpoint: &str) -> Result<Value> {
		self.request(endpoint, RequestOptions::get()).await
	}

	/// `POST endpoint` with a JSON body.
	pub async fn post_json<B>(&self, endpoint: &str, body: &B) -> Result<Value>
	where
		B: ?Sized + Serialize,
	{
		self.request(endpoint, RequestOptions::new(Method::Post).json_from(body)?).await
	}

	/// `PUT endpoint` with a JSON body.
	pub async fn put_json<B>(&self, endpoint: &str, body: &B) -> Result<Value>
	where
		B: ?Sized + Serialize,
	{
		self.request(endpoint, RequestOptions::new(Method::Put).json_from(body)?).await
	}

	/// `PATCH endpoint` with a JSON body.
	pub async fn patch_json<B>(&self, endpoint: &str, body: &B) -> Result<Value>
	where
		B: ?Sized + Serialize,
	{
		self.request(endpoint, RequestOptions::new(Method::Patch).json_from(body)?).await
	}

	/// `DELETE endpoint`.
	pub async fn delete(&self, endpoint: &str) -> Result<Value> {
		self.request(endpoint, RequestOptions::new(Method::Delete)).await
	}

	/// Aborts the outstanding request for `method` + `endpoint`, if any.
	pub fn cancel(&self, endpoint: &str, method: Method) -> bool {
		let cancelled = self.in_flight.cancel(&RequestKey::new(method, endpoint));

		if cancelled {
			obs::log_cancelled(1);
		}

		cancelled
	}

	/// Aborts every outstanding request (navigation/unmount cleanup). Safe to repeat.
	pub fn cancel_all(&self) -> usize {
		let count = self.in_flight.cancel_all();

		obs::log_cancelled(count);

		count
	}

	async fn dispatch(&self, key: &RequestKey, options: RequestOptions) -> Result<Value> {
		// Registered before the token read so cancellation also covers a slow store.
		let (registration, guard) = self.in_flight.register(key);
		let response = Abortable::new(self.send(key, options), registration)
			.await
			.map_err(|_| Error::Cancelled { key: key.clone() })??;

		drop(guard);

		interpret(response)
	}

	async fn send(&self, key: &RequestKey, options: RequestOptions) -> Result<TransportResponse> {
		let token = self.session.load().await?;
		let url = self.config.endpoint_url(key.endpoint())?;
		let RequestOptions { method, body, headers: extra } = options;
		let mut headers = BTreeMap::new();
		let body = match body {
			RequestBody::Empty => {
				headers.insert(CONTENT_TYPE.to_owned(), JSON_MIME.to_owned());

				TransportBody::Empty
			},
			RequestBody::Json(value) => {
				headers.insert(CONTENT_TYPE.to_owned(), JSON_MIME.to_owned());

				TransportBody::Json(serde_json::to_vec(&value).map_err(ConfigError::BodySerialize)?)
			},
			RequestBody::Multipart(form) => TransportBody::Multipart(form),
		};

		if let Some(token) = token {
			headers.insert(AUTHORIZATION.to_owned(), token.authorization());
		}
		for (name, value) in extra {
			headers.insert(name.to_ascii_lowercase(), value);
		}

		let request = TransportRequest { method, url, headers, body };

		Ok(self.transport.send(request).await?)
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestTransport> {
	/// Creates a dispatcher with a reqwest transport built from `config`.
	pub fn new(config: ApiConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			session: self.session.clone(),
			in_flight: self.in_flight.clone(),
		}
	}
}
impl<T> Debug for Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("base_url", &self.config.base_url.as_str())
			.field("in_flight", &self.in_flight.len())
			.finish()
	}
}

fn interpret(response: TransportResponse) -> Result<Value> {
	let status = response.status;

	if response.is_success() {
		return parse_body(&response).map_err(|source| DecodeError::Json { status, source }.into());
	}

	let message = parse_body(&response)
		.ok()
		.and_then(|body| error_message(&body))
		.unwrap_or_else(|| format!("Server error: {status}"));

	Err(Error::Api { status, message })
}

fn parse_body(response: &TransportResponse) -> Result<Value, serde_json::Error> {
	if !response.is_json() {
		let text = String::from_utf8_lossy(&response.body).into_owned();

		return Ok(serde_json::json!({ "text": text }));
	}
	if response.body.iter().all(u8::is_ascii_whitespace) {
		return Ok(Value::Null);
	}

	serde_json::from_slice(&response.body)
}

fn error_message(body: &Value) -> Option<String> {
	["error", "message"]
		.into_iter()
		.filter_map(|field| body.get(field).and_then(Value::as_str))
		.find(|message| !message.is_empty())
		.map(str::to_owned)
}
