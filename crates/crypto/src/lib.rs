//! # fluesterpost-crypto
//!
//! Hybride E2E-Verschluesselung fuer Fluesterpost.
//!
//! ## Module
//! - `e2e` - Hybrid-Cipher (Wrap/Unwrap) und Identitaets-Schluessel-Manager
//! - `keystore` - Client-lokaler Speicher fuer private Schluessel
//! - `types` - Gemeinsame Typen (SchluesselPaar, Nonce, NachrichtenInhalt, etc.)
//! - `error` - Fehlertypen

pub mod e2e;
pub mod error;
pub mod keystore;
pub mod types;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use keystore::LokalerSchluesselSpeicher;
pub use types::{
    NachrichtenInhalt, Nonce, PublicKey, SchluesselPaar, SecretBytes, VerschluesselterInhalt,
};

pub use e2e::{
    decrypt_message, decrypt_or_platzhalter, encrypt_message, hkdf_derive,
    schluessel_paar_generieren, IdentitaetsSchluesselManager, ENTSCHLUESSELUNG_PLATZHALTER,
};
