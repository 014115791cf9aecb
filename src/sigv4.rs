//! AWS Signature Version 4 for requests to IAM-authorized endpoints.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::credentials::AwsCredentials;
use crate::error::{RealError, Result};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// A request to sign. Header names may be given in any case.
#[derive(Debug, Clone)]
pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub url: &'a Url,
    pub headers: Vec<(String, String)>,
    pub payload: &'a [u8],
}

/// Headers to attach to the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub security_token: Option<String>,
}

impl SignedHeaders {
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("Authorization", self.authorization),
            ("X-Amz-Date", self.amz_date),
        ];
        if let Some(token) = self.security_token {
            pairs.push(("X-Amz-Security-Token", token));
        }
        pairs
    }
}

#[derive(Debug, Clone)]
pub struct Signer {
    region: String,
    service: String,
}

impl Signer {
    pub fn new(region: &str, service: &str) -> Self {
        Self {
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    pub fn sign(
        &self,
        request: &SigningRequest<'_>,
        credentials: &AwsCredentials,
        now: DateTime<Utc>,
    ) -> Result<SignedHeaders> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let host = host_header(request.url)?;
        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(name, value)| (name.to_lowercase(), normalize_value(value)))
            .filter(|(name, _)| name != "host" && name != "x-amz-date")
            .collect();
        headers.push(("host".to_string(), host));
        headers.push(("x-amz-date".to_string(), amz_date.clone()));

        let security_token = if credentials.session_token.is_empty() {
            None
        } else {
            headers.retain(|(name, _)| name != "x-amz-security-token");
            headers.push((
                "x-amz-security-token".to_string(),
                credentials.session_token.clone(),
            ));
            Some(credentials.session_token.clone())
        };
        headers.sort();

        let signed_header_names = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical = canonical_request(request, &headers, &signed_header_names);
        tracing::debug!(target: "real_integration::sigv4", "Canonical request:\n{}", canonical);

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex_sha256(canonical.as_bytes())
        );

        let key = signing_key(&credentials.secret_key, &date, &self.region, &self.service)?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        Ok(SignedHeaders {
            authorization: format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, credentials.access_key_id, scope, signed_header_names, signature
            ),
            amz_date,
            security_token,
        })
    }
}

fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| RealError::Signing(format!("URL has no host: {}", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Trim and collapse sequential spaces.
fn normalize_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonical_request(
    request: &SigningRequest<'_>,
    headers: &[(String, String)],
    signed_header_names: &str,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method.to_uppercase(),
        canonical_uri(request.url.path()),
        canonical_query(request.url),
        canonical_headers,
        signed_header_names,
        hex_sha256(request.payload)
    )
}

fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| uri_encode(&percent_decode(segment), true))
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k, true), uri_encode(&v, true)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex_pair = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex_pair.and_then(|pair| u8::from_str_radix(pair, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| RealError::Signing(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EXAMPLE_SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    #[test]
    fn test_signing_key_derivation() {
        let key = signing_key(EXAMPLE_SECRET, "20120215", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_get_vanilla() {
        let url = Url::parse("https://example.amazonaws.com/").unwrap();
        let request = SigningRequest {
            method: "GET",
            url: &url,
            headers: vec![],
            payload: b"",
        };
        let credentials = AwsCredentials::new("AKIDEXAMPLE", EXAMPLE_SECRET, "");
        let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();

        let signed = Signer::new("us-east-1", "service")
            .sign(&request, &credentials, now)
            .unwrap();

        assert_eq!(signed.amz_date, "20150830T123600Z");
        assert!(signed.security_token.is_none());
        assert_eq!(
            signed.authorization,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
    }

    #[test]
    fn test_session_token_is_signed() {
        let url = Url::parse("https://abc.appsync-api.us-east-1.amazonaws.com/graphql").unwrap();
        let request = SigningRequest {
            method: "POST",
            url: &url,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            payload: br#"{"query":"{ self { userId } }"}"#,
        };
        let credentials = AwsCredentials::new("AKID", "secret", "session");
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        let signed = Signer::new("us-east-1", "appsync")
            .sign(&request, &credentials, now)
            .unwrap();

        assert_eq!(signed.security_token.as_deref(), Some("session"));
        assert!(signed.authorization.contains(
            "Credential=AKID/20240301/us-east-1/appsync/aws4_request"
        ));
        assert!(signed.authorization.contains(
            "SignedHeaders=content-type;host;x-amz-date;x-amz-security-token"
        ));

        let pairs = signed.into_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], ("X-Amz-Security-Token", "session".to_string()));
    }

    #[test]
    fn test_signature_depends_on_payload() {
        let url = Url::parse("https://abc.appsync-api.us-east-1.amazonaws.com/graphql").unwrap();
        let credentials = AwsCredentials::new("AKID", "secret", "session");
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let signer = Signer::new("us-east-1", "appsync");

        let sign = |payload: &[u8]| {
            signer
                .sign(
                    &SigningRequest {
                        method: "POST",
                        url: &url,
                        headers: vec![],
                        payload,
                    },
                    &credentials,
                    now,
                )
                .unwrap()
                .authorization
        };

        assert_ne!(sign(&b"{}"[..]), sign(&b"{ }"[..]));
        assert_eq!(sign(&b"{}"[..]), sign(&b"{}"[..]));
    }

    #[test]
    fn test_canonical_uri_and_query() {
        assert_eq!(canonical_uri(""), "/");
        assert_eq!(canonical_uri("/graphql"), "/graphql");
        assert_eq!(canonical_uri("/a b/c"), "/a%20b/c");
        assert_eq!(canonical_uri("/a%20b"), "/a%20b");

        let url = Url::parse("https://example.com/?b=2&a=1&c=x y").unwrap();
        assert_eq!(canonical_query(&url), "a=1&b=2&c=x%20y");
    }

    #[test]
    fn test_host_header_keeps_port() {
        let url = Url::parse("http://127.0.0.1:4000/graphql").unwrap();
        assert_eq!(host_header(&url).unwrap(), "127.0.0.1:4000");
    }
}
