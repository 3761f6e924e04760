//! OSS header signing (signature version 1).
//!
//! ```text
//! Signature = base64(HMAC-SHA1(secret,
//!     VERB "\n" Content-MD5 "\n" Content-Type "\n" Date "\n"
//!     CanonicalizedOSSHeaders CanonicalizedResource))
//! ```

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Everything that goes into the string to sign.
#[derive(Debug, Clone, Default)]
pub struct SignRequest<'a> {
    pub method: &'a str,
    pub content_md5: &'a str,
    pub content_type: &'a str,
    pub date: &'a str,
    /// `x-oss-*` headers, including `x-oss-security-token` for STS
    /// credentials; names are lowercased and sorted when signing.
    pub oss_headers: &'a [(&'a str, &'a str)],
    /// Output of [`canonical_resource`].
    pub resource: &'a str,
}

impl SignRequest<'_> {
    pub fn string_to_sign(&self) -> String {
        let mut headers: Vec<(String, &str)> = self
            .oss_headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.trim()))
            .filter(|(k, _)| k.starts_with("x-oss-"))
            .collect();
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = format!(
            "{}\n{}\n{}\n{}\n",
            self.method, self.content_md5, self.content_type, self.date
        );
        for (name, value) in headers {
            out.push_str(&name);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push_str(self.resource);
        out
    }
}

/// `/{bucket}/{key}` followed by the sorted sub-resources.
///
/// The key is used raw (not URL-encoded), as the service signs it.
pub fn canonical_resource(
    bucket: &str,
    key: &str,
    sub_resources: &[(&str, Option<&str>)],
) -> String {
    let mut resource = format!("/{bucket}/{key}");
    if sub_resources.is_empty() {
        return resource;
    }

    let mut subs: Vec<&(&str, Option<&str>)> = sub_resources.iter().collect();
    subs.sort_by(|a, b| a.0.cmp(b.0));
    let query: Vec<String> = subs
        .into_iter()
        .map(|(k, v)| match v {
            Some(v) => format!("{k}={v}"),
            None => (*k).to_string(),
        })
        .collect();
    resource.push('?');
    resource.push_str(&query.join("&"));
    resource
}

/// Base64 HMAC-SHA1 of `string_to_sign` keyed with the access key secret.
pub fn sign(secret: &str, string_to_sign: &str) -> String {
    // HMAC accepts keys of any length.
    let mut mac = <HmacSha1 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC-SHA1 takes any key length"));
    mac.update(string_to_sign.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// `Authorization` header value.
pub fn authorization(access_key_id: &str, signature: &str) -> String {
    format!("OSS {access_key_id}:{signature}")
}

/// RFC 1123 date as used in the `Date` header.
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
