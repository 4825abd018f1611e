//! Nachrichten-Speicher
//!
//! Das `NachrichtenSpeicher`-Trait abstrahiert die konkrete Persistenz
//! (In-Memory, SQL, etc.). Der Speicher sieht ausschliesslich
//! Ciphertext-Bundles – nie Klartext, nie ausgewickelte Content-Keys.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use fluesterpost_core::{MessageId, UserId};
use fluesterpost_crypto::NachrichtenInhalt;

use crate::error::ChatResult;
use crate::types::NachrichtRecord;

/// Abstrakter Speicher fuer verschluesselte Nachrichten
#[allow(async_fn_in_trait)]
pub trait NachrichtenSpeicher: Send + Sync {
    /// Eine neue Nachricht persistieren
    async fn einfuegen(&self, record: NachrichtRecord) -> ChatResult<()>;

    /// Eine Nachricht anhand ihrer ID laden
    async fn laden(&self, id: MessageId) -> ChatResult<Option<NachrichtRecord>>;

    /// Den Inhalt einer Nachricht atomar ersetzen (Edit)
    ///
    /// Ciphertext, wrapped_key, Nonce und Auth-Tag werden als ein Wert
    /// getauscht – es gibt keinen Zwischenzustand, der alten Ciphertext
    /// mit neuem wrapped_key paart. Gibt `false` zurueck wenn die
    /// Nachricht nicht existiert.
    async fn ersetzen(
        &self,
        id: MessageId,
        inhalt: NachrichtenInhalt,
        aktualisiert_am: DateTime<Utc>,
    ) -> ChatResult<bool>;

    /// Eine Nachricht hart loeschen (kein Tombstone)
    async fn entfernen(&self, id: MessageId) -> ChatResult<bool>;

    /// Alle Nachrichten zwischen zwei Benutzern (beide Richtungen)
    ///
    /// Die Reihenfolge ist nicht definiert – der Aufrufer sortiert
    /// nach `erstellt_am`.
    async fn konversation(&self, a: UserId, b: UserId) -> ChatResult<Vec<NachrichtRecord>>;
}

/// In-Memory-Implementierung des Nachrichten-Speichers
///
/// Referenz-Implementierung fuer Tests und Single-Instance-Betrieb.
/// Die Atomaritaet von `ersetzen` kommt aus dem Entry-Lock der DashMap.
#[derive(Debug, Default)]
pub struct InMemorySpeicher {
    nachrichten: DashMap<MessageId, NachrichtRecord>,
}

impl InMemorySpeicher {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl der gespeicherten Nachrichten
    pub fn anzahl(&self) -> usize {
        self.nachrichten.len()
    }
}

impl NachrichtenSpeicher for InMemorySpeicher {
    async fn einfuegen(&self, record: NachrichtRecord) -> ChatResult<()> {
        tracing::debug!(message_id = %record.id, "Nachricht persistiert");
        self.nachrichten.insert(record.id, record);
        Ok(())
    }

    async fn laden(&self, id: MessageId) -> ChatResult<Option<NachrichtRecord>> {
        Ok(self.nachrichten.get(&id).map(|entry| entry.clone()))
    }

    async fn ersetzen(
        &self,
        id: MessageId,
        inhalt: NachrichtenInhalt,
        aktualisiert_am: DateTime<Utc>,
    ) -> ChatResult<bool> {
        match self.nachrichten.get_mut(&id) {
            Some(mut entry) => {
                entry.inhalt = inhalt;
                entry.aktualisiert_am = aktualisiert_am;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn entfernen(&self, id: MessageId) -> ChatResult<bool> {
        Ok(self.nachrichten.remove(&id).is_some())
    }

    async fn konversation(&self, a: UserId, b: UserId) -> ChatResult<Vec<NachrichtRecord>> {
        Ok(self
            .nachrichten
            .iter()
            .filter(|entry| {
                (entry.sender_id == a && entry.empfaenger_id == b)
                    || (entry.sender_id == b && entry.empfaenger_id == a)
            })
            .map(|entry| entry.clone())
            .collect())
    }
}
