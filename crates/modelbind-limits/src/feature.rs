//! The per-request form feature.
//!
//! The form limits filter installs a [`FormFeature`] before anything reads
//! the body. The first read parses the form under the feature's limits;
//! later reads return the same collection.

use crate::error::FormError;
use crate::options::FormOptions;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use http::HeaderMap;
use indexmap::IndexMap;
use modelbind_core::HttpContext;
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::sync::OnceCell;

const URL_ENCODED: &str = "application/x-www-form-urlencoded";
const FORM_DATA: &str = "multipart/form-data";

/// A file uploaded in a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    name: String,
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

impl FormFile {
    /// Creates a file entry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    /// Returns the form field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the client-supplied file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the declared content type of the part.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the file contents.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the file length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for an empty file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Parsed form values and files, in the order they were sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormCollection {
    fields: IndexMap<String, Vec<String>>,
    files: Vec<FormFile>,
}

impl FormCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `key`.
    pub fn push_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(key.into()).or_default().push(value.into());
    }

    /// Appends a file.
    pub fn push_file(&mut self, file: FormFile) {
        self.files.push(file);
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value for `key`.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.fields.get(key).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `key` has at least one value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Iterates keys in the order they first appeared.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no values and no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// Returns the uploaded files.
    #[must_use]
    pub fn files(&self) -> &[FormFile] {
        &self.files
    }

    /// Returns the first file uploaded under `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&FormFile> {
        self.files.iter().find(|file| file.name == name)
    }
}

struct FormFeatureInner {
    options: FormOptions,
    form: OnceCell<Arc<FormCollection>>,
}

/// Reads the request form under a set of limits, at most once.
///
/// Cloning shares the same parsed form.
#[derive(Clone)]
pub struct FormFeature {
    inner: Arc<FormFeatureInner>,
}

impl FormFeature {
    /// Creates a feature that has not read the form yet.
    #[must_use]
    pub fn new(options: FormOptions) -> Self {
        Self {
            inner: Arc::new(FormFeatureInner {
                options,
                form: OnceCell::new(),
            }),
        }
    }

    /// Returns the limits used when reading.
    #[must_use]
    pub fn options(&self) -> &FormOptions {
        &self.inner.options
    }

    /// Returns `true` once the form has been read or assigned.
    #[must_use]
    pub fn has_form(&self) -> bool {
        self.inner.form.initialized()
    }

    /// Returns the form, if it has been read.
    #[must_use]
    pub fn form(&self) -> Option<&FormCollection> {
        self.inner.form.get().map(Arc::as_ref)
    }

    /// Assigns the form without reading the body.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::AlreadyRead`] if a form is already present.
    pub fn set_form(&self, form: FormCollection) -> Result<(), FormError> {
        self.inner
            .form
            .set(Arc::new(form))
            .map_err(|_| FormError::AlreadyRead)
    }

    /// Reads the form from the request body, or returns the one already read.
    ///
    /// # Errors
    ///
    /// Returns a [`FormError`] if the content type is not a form type, a
    /// limit is exceeded, or the body is malformed. A failed read can be
    /// retried only if the body has not been consumed.
    pub async fn read_form(
        &self,
        http_context: &HttpContext,
    ) -> Result<Arc<FormCollection>, FormError> {
        let form = self
            .inner
            .form
            .get_or_try_init(|| async {
                let form = parse_form(&self.inner.options, http_context).await?;
                tracing::debug!(
                    request_id = %http_context.request_id(),
                    keys = form.len(),
                    files = form.files().len(),
                    "Read request form"
                );
                Ok::<_, FormError>(Arc::new(form))
            })
            .await?;
        Ok(Arc::clone(form))
    }
}

impl Default for FormFeature {
    fn default() -> Self {
        Self::new(FormOptions::default())
    }
}

impl fmt::Debug for FormFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormFeature")
            .field("options", &self.inner.options)
            .field("has_form", &self.has_form())
            .finish()
    }
}

/// Reads the request form, installing a default [`FormFeature`] first if
/// no limits filter installed one.
///
/// # Errors
///
/// See [`FormFeature::read_form`].
pub async fn read_form(http_context: &mut HttpContext) -> Result<Arc<FormCollection>, FormError> {
    let existing = http_context.features().get::<FormFeature>().cloned();
    let feature = match existing {
        Some(feature) => feature,
        None => {
            let feature = FormFeature::default();
            http_context.features_mut().insert(feature.clone());
            feature
        }
    };
    feature.read_form(http_context).await
}

async fn parse_form(
    options: &FormOptions,
    http_context: &HttpContext,
) -> Result<FormCollection, FormError> {
    let content_type = http_context.content_type().unwrap_or_default();
    let essence = content_type
        .parse::<mime::Mime>()
        .map(|media_type| media_type.essence_str().to_string())
        .unwrap_or_default();

    match essence.as_str() {
        URL_ENCODED => read_url_encoded(options, http_context).await,
        FORM_DATA => read_multipart(options, http_context, content_type).await,
        _ => Err(FormError::UnsupportedContentType(content_type.to_string())),
    }
}

async fn read_url_encoded(
    options: &FormOptions,
    http_context: &HttpContext,
) -> Result<FormCollection, FormError> {
    let limit = options.buffer_body.then_some(options.buffer_body_length_limit);
    if let (Some(limit), Some(declared)) = (limit, http_context.content_length()) {
        if declared > limit {
            return Err(FormError::BodyTooLarge { limit });
        }
    }

    let capacity = http_context
        .content_length()
        .map_or(0, |declared| usize::try_from(declared).unwrap_or(usize::MAX))
        .min(options.memory_buffer_threshold);
    let mut stream = http_context.body().take_stream().ok_or_else(body_consumed)?;
    let mut reader = UrlEncodedReader::new(options, capacity);
    let mut total: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(limit) = limit {
            total = total.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
            if total > limit {
                return Err(FormError::BodyTooLarge { limit });
            }
        }
        reader.push(&chunk)?;
    }

    reader.finish()
}

/// Splits a url-encoded body into pairs as chunks arrive.
///
/// Only the pair currently being read is held in memory, and it is rejected
/// as soon as its encoded length proves a key or value limit is exceeded.
struct UrlEncodedReader<'a> {
    options: &'a FormOptions,
    pending: BytesMut,
    count: usize,
    form: FormCollection,
}

impl<'a> UrlEncodedReader<'a> {
    fn new(options: &'a FormOptions, capacity: usize) -> Self {
        Self {
            options,
            pending: BytesMut::with_capacity(capacity),
            count: 0,
            form: FormCollection::new(),
        }
    }

    fn push(&mut self, mut chunk: &[u8]) -> Result<(), FormError> {
        while let Some(end) = chunk.iter().position(|&byte| byte == b'&') {
            self.pending.extend_from_slice(&chunk[..end]);
            self.flush()?;
            chunk = &chunk[end + 1..];
        }
        self.pending.extend_from_slice(chunk);
        self.check_pending()
    }

    fn finish(mut self) -> Result<FormCollection, FormError> {
        self.flush()?;
        Ok(self.form)
    }

    fn flush(&mut self) -> Result<(), FormError> {
        let segment = self.pending.split();
        if segment.is_empty() {
            return Ok(());
        }

        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&segment)
            .map_err(|e| FormError::Malformed(e.to_string()))?;
        for (key, value) in pairs {
            self.count += 1;
            check_value_count(self.options, self.count)?;
            check_key(self.options, &key)?;
            check_value(self.options, &value)?;
            self.form.push_value(key, value);
        }
        Ok(())
    }

    // A percent-escape decodes three bytes into one, so an encoded part
    // longer than three times its limit cannot decode within it.
    fn check_pending(&self) -> Result<(), FormError> {
        let (key, value) = match self.pending.iter().position(|&byte| byte == b'=') {
            Some(eq) => (eq, self.pending.len() - eq - 1),
            None => (self.pending.len(), 0),
        };
        if key > self.options.key_length_limit.saturating_mul(3) {
            return Err(FormError::KeyTooLong {
                limit: self.options.key_length_limit,
            });
        }
        if value > self.options.value_length_limit.saturating_mul(3) {
            return Err(FormError::ValueTooLong {
                limit: self.options.value_length_limit,
            });
        }
        Ok(())
    }
}

async fn read_multipart(
    options: &FormOptions,
    http_context: &HttpContext,
    content_type: &str,
) -> Result<FormCollection, FormError> {
    let boundary = multer::parse_boundary(content_type)?;
    if boundary.len() > options.multipart_boundary_length_limit {
        return Err(FormError::BoundaryTooLong {
            limit: options.multipart_boundary_length_limit,
        });
    }

    let stream = http_context.body().take_stream().ok_or_else(body_consumed)?;
    let constraints = multer::Constraints::new()
        .size_limit(multer::SizeLimit::new().whole_stream(options.multipart_body_length_limit));
    let mut multipart = multer::Multipart::with_constraints(stream, boundary, constraints);

    let mut form = FormCollection::new();
    let mut count = 0;
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        count += 1;
        check_value_count(options, count)?;
        check_headers(options, field.headers())?;

        let name = field.name().unwrap_or_default().to_string();
        check_key(options, &name)?;

        if let Some(file_name) = field.file_name().map(ToString::to_string) {
            let content_type = field.content_type().map(ToString::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;
            form.push_file(FormFile::new(name, file_name, content_type, data));
        } else {
            let value = read_text_field(options, &mut field).await?;
            form.push_value(name, value);
        }
    }
    Ok(form)
}

async fn read_text_field(
    options: &FormOptions,
    field: &mut multer::Field<'_>,
) -> Result<String, FormError> {
    let mut value = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if value.len() + chunk.len() > options.value_length_limit {
            return Err(FormError::ValueTooLong {
                limit: options.value_length_limit,
            });
        }
        value.extend_from_slice(&chunk);
    }
    String::from_utf8(value.to_vec()).map_err(|e| FormError::Malformed(e.to_string()))
}

fn body_consumed() -> FormError {
    FormError::Io(io::Error::other("request body has already been consumed"))
}

fn multipart_error(err: multer::Error) -> FormError {
    match err {
        multer::Error::StreamSizeExceeded { limit } => FormError::BodyTooLarge { limit },
        other => FormError::Multipart(other),
    }
}

fn check_value_count(options: &FormOptions, count: usize) -> Result<(), FormError> {
    if count > options.value_count_limit {
        return Err(FormError::TooManyValues {
            limit: options.value_count_limit,
        });
    }
    Ok(())
}

fn check_key(options: &FormOptions, key: &str) -> Result<(), FormError> {
    if key.len() > options.key_length_limit {
        return Err(FormError::KeyTooLong {
            limit: options.key_length_limit,
        });
    }
    Ok(())
}

fn check_value(options: &FormOptions, value: &str) -> Result<(), FormError> {
    if value.len() > options.value_length_limit {
        return Err(FormError::ValueTooLong {
            limit: options.value_length_limit,
        });
    }
    Ok(())
}

fn check_headers(options: &FormOptions, headers: &HeaderMap) -> Result<(), FormError> {
    if headers.len() > options.multipart_headers_count_limit {
        return Err(FormError::TooManyHeaders {
            limit: options.multipart_headers_count_limit,
        });
    }

    let length: usize = headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum();
    if length > options.multipart_headers_length_limit {
        return Err(FormError::HeadersTooLong {
            limit: options.multipart_headers_length_limit,
        });
    }
    Ok(())
}
