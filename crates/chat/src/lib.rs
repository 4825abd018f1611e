//! fluesterpost-chat – Nachrichten-Mutations-Protokoll
//!
//! Dieses Crate implementiert:
//! - NachrichtenDienst: Senden, Editieren, Loeschen mit E2E-Verschluesselung
//! - NachrichtenSpeicher-Trait + InMemorySpeicher-Implementierung
//! - VerbindungsVerzeichnis: Best-Effort-Push an Live-Verbindungen
//!
//! # Beispiel
//!
//! ```no_run
//! use std::sync::Arc;
//! use fluesterpost_chat::{InMemorySpeicher, NachrichtenDienst, VerbindungsVerzeichnis};
//! use fluesterpost_core::UserId;
//! use fluesterpost_crypto::{IdentitaetsSchluesselManager, SecretBytes};
//!
//! #[tokio::main]
//! async fn main() {
//!     let schluessel = Arc::new(IdentitaetsSchluesselManager::neu(
//!         SecretBytes::new(vec![0u8; 32]),
//!     ));
//!     let speicher = Arc::new(InMemorySpeicher::neu());
//!     let verbindungen = VerbindungsVerzeichnis::neu();
//!
//!     let dienst = NachrichtenDienst::neu(speicher, schluessel.clone(), verbindungen);
//!
//!     let alice = UserId::new();
//!     let bob = UserId::new();
//!     schluessel.identitaet_erstellen(alice).unwrap();
//!     schluessel.identitaet_erstellen(bob).unwrap();
//!
//!     dienst.senden(alice, bob, "Hallo Bob!", None).await.unwrap();
//! }
//! ```

pub mod error;
pub mod service;
pub mod storage;
pub mod types;
pub mod verbindung;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use error::{ChatError, ChatResult};
pub use service::{NachrichtenDienst, MAX_NACHRICHT_LAENGE};
pub use storage::{InMemorySpeicher, NachrichtenSpeicher};
pub use types::{ChatEvent, NachrichtDraht, NachrichtRecord};
pub use verbindung::{ClientSender, VerbindungsVerzeichnis};
