//! Oeffentliche Typen fuer das Nachrichten-Protokoll

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fluesterpost_core::{MessageId, UserId};
use fluesterpost_crypto::{NachrichtenInhalt, Nonce, VerschluesselterInhalt};

use crate::error::{ChatError, ChatResult};

/// Eine persistierte verschluesselte Nachricht (Domain-Typ)
///
/// Der Speicher haelt nie Klartext und nie ausgewickelte Content-Keys.
/// `inhalt` wird beim Edit als Ganzes ersetzt; Loeschen ist hart
/// (kein Tombstone).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NachrichtRecord {
    pub id: MessageId,
    pub sender_id: UserId,
    pub empfaenger_id: UserId,
    pub inhalt: NachrichtenInhalt,
    /// Opake Bild-URL (Objekt-Speicher, nicht Teil dieses Kerns)
    pub bild: Option<String>,
    pub erstellt_am: DateTime<Utc>,
    pub aktualisiert_am: DateTime<Utc>,
}

/// Drahtformat einer Nachricht (JSON)
///
/// Bei leerem Inhalt (reines Bild) fehlen die Krypto-Felder komplett;
/// `auth_tag` ist vorhanden sobald ein Ciphertext vorhanden ist
/// (AES-256-GCM ist immer authentifiziert).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NachrichtDraht {
    pub id: MessageId,
    pub sender_id: UserId,
    pub empfaenger_id: UserId,
    /// Base64-kodierter Ciphertext
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciphertext: Option<String>,
    /// Base64-kodierter eingewickelter Content-Key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapped_key: Option<String>,
    /// Hex-kodierte Nonce (feste Laenge 24 Zeichen)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Hex-kodierter Auth-Tag (feste Laenge 32 Zeichen)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bild: Option<String>,
    pub erstellt_am: DateTime<Utc>,
    pub aktualisiert_am: DateTime<Utc>,
}

impl NachrichtDraht {
    /// Kodiert einen Domain-Record ins Drahtformat
    pub fn aus_record(record: &NachrichtRecord) -> Self {
        let (ciphertext, wrapped_key, nonce, auth_tag) = match &record.inhalt {
            NachrichtenInhalt::Leer => (None, None, None, None),
            NachrichtenInhalt::Verschluesselt(v) => (
                Some(STANDARD.encode(&v.ciphertext)),
                Some(STANDARD.encode(&v.wrapped_key)),
                Some(v.nonce.als_hex()),
                Some(hex::encode(v.auth_tag)),
            ),
        };

        Self {
            id: record.id,
            sender_id: record.sender_id,
            empfaenger_id: record.empfaenger_id,
            ciphertext,
            wrapped_key,
            nonce,
            auth_tag,
            bild: record.bild.clone(),
            erstellt_am: record.erstellt_am,
            aktualisiert_am: record.aktualisiert_am,
        }
    }

    /// Dekodiert das Drahtformat zurueck in einen Domain-Record
    ///
    /// Die Krypto-Felder muessen entweder alle vorhanden oder alle
    /// abwesend sein – ein loser Sack optionaler Felder wird abgelehnt.
    pub fn in_record(&self) -> ChatResult<NachrichtRecord> {
        let inhalt = match (&self.ciphertext, &self.wrapped_key, &self.nonce, &self.auth_tag) {
            (None, None, None, None) => NachrichtenInhalt::Leer,
            (Some(ct), Some(wk), Some(nonce), Some(tag)) => {
                let auth_tag: [u8; 16] = hex::decode(tag)
                    .map_err(fluesterpost_crypto::CryptoError::from)?
                    .try_into()
                    .map_err(|_| {
                        ChatError::UngueltigeEingabe("Auth-Tag muss 16 Bytes lang sein".into())
                    })?;
                NachrichtenInhalt::Verschluesselt(VerschluesselterInhalt {
                    ciphertext: STANDARD
                        .decode(ct)
                        .map_err(fluesterpost_crypto::CryptoError::from)?,
                    wrapped_key: STANDARD
                        .decode(wk)
                        .map_err(fluesterpost_crypto::CryptoError::from)?,
                    nonce: Nonce::aus_hex(nonce)?,
                    auth_tag,
                })
            }
            _ => {
                return Err(ChatError::UngueltigeEingabe(
                    "Krypto-Felder muessen vollstaendig oder gar nicht vorhanden sein".into(),
                ))
            }
        };

        Ok(NachrichtRecord {
            id: self.id,
            sender_id: self.sender_id,
            empfaenger_id: self.empfaenger_id,
            inhalt,
            bild: self.bild.clone(),
            erstellt_am: self.erstellt_am,
            aktualisiert_am: self.aktualisiert_am,
        })
    }
}

/// Realtime-Events an die Live-Verbindung genau eines Empfaengers
///
/// Jedes Event ist ein einmaliger Push ohne Wiederholung und ohne
/// Reihenfolge-Garantie gegenueber Nachrichten anderer Absender.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Neue Nachricht (persistierter Stand)
    NeueNachricht { nachricht: NachrichtDraht },
    /// Nachricht editiert – traegt den neuen Bundle und (nur fuer die
    /// Live-Anzeige) den Klartext; der Klartext wird nie persistiert
    NachrichtEditiert {
        message_id: MessageId,
        nachricht: NachrichtDraht,
        klartext: String,
    },
    /// Nachricht geloescht (nur die ID)
    NachrichtGeloescht { message_id: MessageId },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
