use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

/// Generate an unguessable, URL-safe token from `bytes` random bytes
pub fn generate_token(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    rand::fill(buffer.as_mut_slice());
    URL_SAFE_NO_PAD.encode(buffer)
}
