//! Transport primitives for backend calls.
//!
//! The module exposes [`HttpTransport`] alongside the transport-agnostic request and response
//! shapes so hosts can plug in custom HTTP stacks (or fakes in tests) without touching the
//! dispatcher. The dispatcher owns authorization, dedup, and response interpretation; a
//! transport only moves bytes.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::ApiConfig, error::ConfigError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing backend calls.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// every dispatcher clone, and the returned future must be `Send` so callers can hop
/// executors. Dropping the future must stop waiting on the response; the dispatcher relies on
/// that to abort superseded requests.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and resolves with the raw response.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// HTTP verbs used against the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Method {
	/// `GET`.
	#[default]
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the upper-case wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully prepared request handed to a transport.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Header map keyed by lower-case header name.
	pub headers: BTreeMap<String, String>,
	/// Encoded request body.
	pub body: TransportBody,
}

/// Encoded request body.
#[derive(Clone, Debug, Default)]
pub enum TransportBody {
	/// No body.
	#[default]
	Empty,
	/// Serialized JSON bytes.
	Json(Vec<u8>),
	/// Multipart payload; the transport owns the boundary and content type.
	Multipart(MultipartForm),
}

/// Transport-agnostic multipart payload (profile pictures, event covers, etc.).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
	/// Parts in insertion order.
	pub parts: Vec<MultipartPart>,
}
impl MultipartForm {
	/// Creates an empty form.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a plain text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push(MultipartPart::Text { name: name.into(), value: value.into() });

		self
	}

	/// Appends a file field.
	pub fn file(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		mime: Option<&str>,
		bytes: impl Into<Vec<u8>>,
	) -> Self {
		self.parts.push(MultipartPart::File {
			name: name.into(),
			file_name: file_name.into(),
			mime: mime.map(str::to_owned),
			bytes: bytes.into(),
		});

		self
	}

	/// Returns `true` when no part has been added.
	pub fn is_empty(&self) -> bool {
		self.parts.is_empty()
	}
}

/// A single multipart field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MultipartPart {
	/// Plain text field.
	Text {
		/// Field name.
		name: String,
		/// Field value.
		value: String,
	},
	/// Binary file field.
	File {
		/// Field name.
		name: String,
		/// File name reported to the backend.
		file_name: String,
		/// Optional MIME type.
		mime: Option<String>,
		/// File contents.
		bytes: Vec<u8>,
	},
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, Default)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Value of the `content-type` header, if any.
	pub content_type: Option<String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when the content type announces JSON.
	pub fn is_json(&self) -> bool {
		self.content_type.as_deref().is_some_and(|value| value.contains("application/json"))
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the timeout and user agent from `config`.
	pub fn from_config(config: &ApiConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder();

		if let Some(timeout) = config.timeout {
			builder = builder.timeout(timeout);
		}
		if let Some(agent) = &config.user_agent {
			builder = builder.user_agent(agent.as_str());
		}

		let client = builder.build().map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	fn method(method: Method) -> reqwest::Method {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}

	fn multipart(form: MultipartForm) -> Result<reqwest::multipart::Form, TransportError> {
		use reqwest::multipart::{Form, Part};

		let mut out = Form::new();

		for part in form.parts {
			out = match part {
				MultipartPart::Text { name, value } => out.text(name, value),
				MultipartPart::File { name, file_name, mime, bytes } => {
					let mut file = Part::bytes(bytes).file_name(file_name);

					if let Some(mime) = mime {
						file = file.mime_str(&mime)?;
					}

					out.part(name, file)
				},
			};
		}

		Ok(out)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let TransportRequest { method, url, headers, body } = request;
			let mut builder = client.request(Self::method(method), url);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			builder = match body {
				TransportBody::Empty => builder,
				TransportBody::Json(bytes) => builder.body(bytes),
				TransportBody::Multipart(form) => builder.multipart(Self::multipart(form)?),
			};

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let content_type = response
				.headers()
				.get(reqwest::header::CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, content_type, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn json_detection_tolerates_charset_suffix() {
		let response = TransportResponse {
			status: 200,
			content_type: Some("application/json; charset=utf-8".into()),
			body: Vec::new(),
		};

		assert!(response.is_json());
		assert!(response.is_success());

		let response = TransportResponse { content_type: Some("text/html".into()), ..response };

		assert!(!response.is_json());
	}

	#[test]
	fn multipart_builder_keeps_insertion_order() {
		let form = MultipartForm::new().text("title", "Jazz night").file(
			"cover",
			"cover.png",
			Some("image/png"),
			vec![0x89, 0x50],
		);

		assert_eq!(form.parts.len(), 2);
		assert!(matches!(&form.parts[0], MultipartPart::Text { name, .. } if name == "title"));
		assert!(matches!(&form.parts[1], MultipartPart::File { file_name, .. } if file_name == "cover.png"));
	}

	#[test]
	fn method_labels_are_upper_case() {
		assert_eq!(Method::Delete.to_string(), "DELETE");
		assert_eq!(Method::default(), Method::Get);
	}
}
