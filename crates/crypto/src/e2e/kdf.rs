//! HKDF-SHA256 Key-Ableitung
//!
//! Wird fuer das Einwickeln des Content-Keys und fuer die Ablage der
//! privaten Schluessel unter dem Server-Geheimnis verwendet.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};

/// Leitet Schluesselmaterial via HKDF-SHA256 ab
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::SchluesselAbleitung(e.to_string()))?;
    Ok(okm)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hkdf_derive_deterministisch() {
        let key1 = hkdf_derive(b"ikm", b"salt", b"info", 32).unwrap();
        let key2 = hkdf_derive(b"ikm", b"salt", b"info", 32).unwrap();
        assert_eq!(key1, key2);
        assert_eq!(key1.len(), 32);
    }

    #[test]
    fn verschiedene_infos_geben_verschiedene_keys() {
        let key1 = hkdf_derive(b"ikm", b"salt", b"info-1", 32).unwrap();
        let key2 = hkdf_derive(b"ikm", b"salt", b"info-2", 32).unwrap();
        assert_ne!(key1, key2);
    }
}
