//! WS-Security UsernameToken (PasswordDigest) header

use base64::Engine;
use rand::Rng;
use sha1::{Digest, Sha1};

/// Generate a fresh WS-Security header for one SOAP request
pub fn generate_ws_security_header(username: &str, password: &str) -> String {
    // Nonce生成（16バイトランダム）
    let nonce: [u8; 16] = rand::thread_rng().gen();
    // Created タイムスタンプ
    let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    build_security_header(username, password, &nonce, &created)
}

/// Password Digest = Base64(SHA1(nonce + created + password))
pub fn password_digest(nonce: &[u8], created: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(password.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

pub fn build_security_header(username: &str, password: &str, nonce: &[u8], created: &str) -> String {
    let digest = password_digest(nonce, created, password);
    let nonce_base64 = base64::engine::general_purpose::STANDARD.encode(nonce);

    format!(
        r#"<s:Header>
    <Security xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd"
              s:mustUnderstand="true">
      <UsernameToken>
        <Username>{}</Username>
        <Password Type="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest">{}</Password>
        <Nonce EncodingType="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary">{}</Nonce>
        <Created xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">{}</Created>
      </UsernameToken>
    </Security>
  </s:Header>"#,
        escape_xml(username),
        digest,
        nonce_base64,
        created
    )
}

/// Minimal escaping for text nodes
pub fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_digest_known_vector() {
        let nonce: Vec<u8> = (0u8..16).collect();
        let digest = password_digest(&nonce, "2024-01-01T00:00:00Z", "admin!");
        assert_eq!(digest, "0cpbZIwVb0BzDGWiFH12EPI8/0M=");
    }

    #[test]
    fn test_security_header_generation() {
        let header = generate_ws_security_header("admin", "testpass");
        assert!(header.contains("<Username>admin</Username>"));
        assert!(header.contains("PasswordDigest"));
        assert!(header.contains("<Created"));
    }

    #[test]
    fn test_build_header_embeds_nonce() {
        let nonce: Vec<u8> = (0u8..16).collect();
        let header = build_security_header("a<b", "pw", &nonce, "2024-01-01T00:00:00Z");
        assert!(header.contains("AAECAwQFBgcICQoLDA0ODw=="));
        assert!(header.contains("<Username>a&lt;b</Username>"));
    }
}
