//! Verbindungs-Verzeichnis – wer ist gerade live verbunden?
//!
//! Das Verzeichnis gehoert dem externen Transport (Lebenszyklus:
//! Registrieren bei Connect, Entfernen bei Disconnect). Der
//! Nachrichten-Dienst fragt es nur ab und mutiert es nie.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use fluesterpost_core::UserId;

use crate::types::ChatEvent;

/// Groesse der Send-Queue pro Client
const SEND_QUEUE_GROESSE: usize = 64;

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub user_id: UserId,
    tx: mpsc::Sender<ChatEvent>,
}

impl ClientSender {
    /// Sendet ein Event nicht-blockierend an den Client (Best-Effort)
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    /// Verworfene Events werden nicht wiederholt und nicht nachgeliefert –
    /// Offline-Clients holen den Stand spaeter ueber die History.
    pub fn senden(&self, event: ChatEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(user_id = %self.user_id, "Send-Queue voll – Event verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(user_id = %self.user_id, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

/// Verzeichnis der Live-Verbindungen aller Benutzer
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
/// Pro Benutzer existiert hoechstens eine Live-Verbindung.
#[derive(Clone, Default)]
pub struct VerbindungsVerzeichnis {
    inner: Arc<VerbindungsVerzeichnisInner>,
}

#[derive(Default)]
struct VerbindungsVerzeichnisInner {
    clients: DashMap<UserId, ClientSender>,
}

impl VerbindungsVerzeichnis {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert einen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Der Transport liest aus dieser Queue und sendet an den Client.
    pub fn registrieren(&self, user_id: UserId) -> mpsc::Receiver<ChatEvent> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        self.inner.clients.insert(user_id, ClientSender { user_id, tx });
        tracing::debug!(user_id = %user_id, "Client im Verbindungs-Verzeichnis registriert");
        rx
    }

    /// Entfernt einen Client (Verbindung getrennt)
    pub fn entfernen(&self, user_id: &UserId) {
        self.inner.clients.remove(user_id);
        tracing::debug!(user_id = %user_id, "Client aus Verbindungs-Verzeichnis entfernt");
    }

    /// Gibt die Live-Verbindung eines Benutzers zurueck, falls vorhanden
    pub fn abfragen(&self, user_id: &UserId) -> Option<ClientSender> {
        self.inner.clients.get(user_id).map(|entry| entry.clone())
    }

    /// Anzahl der aktuell verbundenen Clients
    pub fn anzahl(&self) -> usize {
        self.inner.clients.len()
    }
}
