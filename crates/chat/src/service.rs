//! NachrichtenDienst – Senden, Editieren, Loeschen verschluesselter Nachrichten
//!
//! Orchestriert pro Nachricht die feste Sequenz
//! Schluessel-Lookup -> Wrap -> Persistieren -> Push. Die Krypto-Schritte
//! sind synchron und frei parallelisierbar; nur die I/O-Schritte sind
//! async. Schlaegt ein I/O-Schritt nach erfolgreichem Wrap fehl, wird das
//! Schluesselmaterial verworfen – eine Wiederholung erzeugt immer einen
//! frischen Content-Key, nie eine Wiederverwendung des alten Bundles.

use std::sync::Arc;

use chrono::Utc;

use fluesterpost_core::{MessageId, UserId};
use fluesterpost_crypto::{encrypt_message, IdentitaetsSchluesselManager};

use crate::{
    error::{ChatError, ChatResult},
    storage::NachrichtenSpeicher,
    types::{ChatEvent, NachrichtDraht, NachrichtRecord},
    verbindung::VerbindungsVerzeichnis,
};

/// Maximale Klartext-Laenge einer Nachricht in Zeichen
pub const MAX_NACHRICHT_LAENGE: usize = 4096;

/// Dienst fuer das Mutations-Protokoll verschluesselter Nachrichten
///
/// Zustandsmaschine pro Nachricht: `Gesendet -> {Editiert* -> Gesendet}
/// -> Geloescht` (terminal). Mutations-Rechte liegen ausschliesslich
/// beim Verfasser.
pub struct NachrichtenDienst<S: NachrichtenSpeicher> {
    speicher: Arc<S>,
    schluessel: Arc<IdentitaetsSchluesselManager>,
    verbindungen: VerbindungsVerzeichnis,
}

impl<S: NachrichtenSpeicher> NachrichtenDienst<S> {
    /// Erstellt einen neuen NachrichtenDienst
    pub fn neu(
        speicher: Arc<S>,
        schluessel: Arc<IdentitaetsSchluesselManager>,
        verbindungen: VerbindungsVerzeichnis,
    ) -> Arc<Self> {
        Arc::new(Self {
            speicher,
            schluessel,
            verbindungen,
        })
    }

    /// Nachricht an einen Empfaenger senden
    ///
    /// Reihenfolge: Schluessel-Lookup, Wrap, Persistieren, Push. Schlaegt
    /// der Wrap fehl, wird nichts persistiert (kein Klartext-Fallback).
    /// Der Push ist Best-Effort: ist der Empfaenger offline, erreicht ihn
    /// die Nachricht nur ueber einen spaeteren History-Abruf.
    pub async fn senden(
        &self,
        sender_id: UserId,
        empfaenger_id: UserId,
        klartext: &str,
        bild: Option<String>,
    ) -> ChatResult<NachrichtRecord> {
        if klartext.is_empty() && bild.is_none() {
            return Err(ChatError::UngueltigeEingabe(
                "Nachricht braucht Text oder Bild".into(),
            ));
        }
        klartext_laenge_pruefen(klartext)?;

        let empfaenger_key = self
            .schluessel
            .public_key_abfragen(&empfaenger_id)
            .map_err(|_| ChatError::EmpfaengerNichtGefunden(empfaenger_id.to_string()))?;

        // Frischer Content-Key pro Vorgang; leerer Text ergibt Leer
        let inhalt = encrypt_message(klartext, &empfaenger_key)?;

        let jetzt = Utc::now();
        let record = NachrichtRecord {
            id: MessageId::new(),
            sender_id,
            empfaenger_id,
            inhalt,
            bild,
            erstellt_am: jetzt,
            aktualisiert_am: jetzt,
        };

        self.speicher.einfuegen(record.clone()).await?;
        tracing::info!(
            message_id = %record.id,
            sender_id = %sender_id,
            empfaenger_id = %empfaenger_id,
            "Nachricht gesendet"
        );

        self.push_an_empfaenger(
            &empfaenger_id,
            ChatEvent::NeueNachricht {
                nachricht: NachrichtDraht::aus_record(&record),
            },
        );

        Ok(record)
    }

    /// Nachricht editieren (nur eigene Nachrichten)
    ///
    /// Der gespeicherte Datensatz muss exakt zu
    /// `(message_id, sender_id=anfrager, empfaenger_id)` passen, sonst
    /// `KeineBerechtigung` ohne jede Zustandsaenderung. Es wird immer ein
    /// brandneuer Content-Key erzeugt – nie der des Erst-Versands oder
    /// eines frueheren Edits wiederverwendet. Ciphertext, wrapped_key,
    /// Nonce und Auth-Tag werden atomar zusammen ersetzt.
    pub async fn editieren(
        &self,
        message_id: MessageId,
        anfrager_id: UserId,
        empfaenger_id: UserId,
        neuer_klartext: &str,
    ) -> ChatResult<NachrichtRecord> {
        if neuer_klartext.is_empty() {
            return Err(ChatError::UngueltigeEingabe(
                "Neuer Nachrichteninhalt darf nicht leer sein".into(),
            ));
        }
        klartext_laenge_pruefen(neuer_klartext)?;

        let bestehend = self.autorisieren(message_id, anfrager_id, empfaenger_id).await?;

        let empfaenger_key = self
            .schluessel
            .public_key_abfragen(&empfaenger_id)
            .map_err(|_| ChatError::EmpfaengerNichtGefunden(empfaenger_id.to_string()))?;

        let neuer_inhalt = encrypt_message(neuer_klartext, &empfaenger_key)?;
        let jetzt = Utc::now();

        let ersetzt = self
            .speicher
            .ersetzen(message_id, neuer_inhalt.clone(), jetzt)
            .await?;
        if !ersetzt {
            // Race mit einem parallelen Delete – Last-Write-Wins, dokumentiert
            return Err(ChatError::NachrichtNichtGefunden(message_id.to_string()));
        }

        let record = NachrichtRecord {
            inhalt: neuer_inhalt,
            aktualisiert_am: jetzt,
            ..bestehend
        };

        tracing::info!(message_id = %message_id, sender_id = %anfrager_id, "Nachricht editiert");

        // Klartext nur an die Live-Verbindung des autorisierten
        // Empfaengers – nie persistiert
        self.push_an_empfaenger(
            &empfaenger_id,
            ChatEvent::NachrichtEditiert {
                message_id,
                nachricht: NachrichtDraht::aus_record(&record),
                klartext: neuer_klartext.to_string(),
            },
        );

        Ok(record)
    }

    /// Nachricht hart loeschen (nur eigene Nachrichten)
    ///
    /// Gleiche Autorisierung wie beim Editieren. Das Delete-Event (nur
    /// die ID) geht vor dem Entfernen an die Live-Verbindung des
    /// Empfaengers raus.
    pub async fn loeschen(
        &self,
        message_id: MessageId,
        anfrager_id: UserId,
        empfaenger_id: UserId,
    ) -> ChatResult<()> {
        self.autorisieren(message_id, anfrager_id, empfaenger_id).await?;

        self.push_an_empfaenger(&empfaenger_id, ChatEvent::NachrichtGeloescht { message_id });

        self.speicher.entfernen(message_id).await?;
        tracing::info!(message_id = %message_id, sender_id = %anfrager_id, "Nachricht geloescht");
        Ok(())
    }

    /// Alle Nachrichten zwischen zwei Benutzern laden
    ///
    /// Die Reihenfolge ist nicht definiert – der Aufrufer sortiert nach
    /// `erstellt_am`. Entschluesselt wird ausschliesslich beim Client.
    pub async fn konversation(&self, a: UserId, b: UserId) -> ChatResult<Vec<NachrichtRecord>> {
        self.speicher.konversation(a, b).await
    }

    /// Prueft das Autorisierungs-Praedikat `(message_id, sender, empfaenger)`
    ///
    /// Compare-and-check-then-write: der Datensatz wird geladen und exakt
    /// verglichen; ein Versionsfeld gibt es bewusst nicht (bekanntes
    /// Last-Write-Wins-Race bei parallelen Mutationen).
    async fn autorisieren(
        &self,
        message_id: MessageId,
        anfrager_id: UserId,
        empfaenger_id: UserId,
    ) -> ChatResult<NachrichtRecord> {
        let record = self
            .speicher
            .laden(message_id)
            .await?
            .ok_or_else(|| ChatError::NachrichtNichtGefunden(message_id.to_string()))?;

        if record.sender_id != anfrager_id || record.empfaenger_id != empfaenger_id {
            return Err(ChatError::KeineBerechtigung(
                "Nur der Verfasser darf die Nachricht veraendern".into(),
            ));
        }

        Ok(record)
    }

    /// Einmaliger Best-Effort-Push an die Live-Verbindung eines Empfaengers
    ///
    /// Kein Retry, keine Queue fuer Offline-Empfaenger.
    fn push_an_empfaenger(&self, empfaenger_id: &UserId, event: ChatEvent) {
        if let Some(verbindung) = self.verbindungen.abfragen(empfaenger_id) {
            verbindung.senden(event);
        }
    }
}

/// Prueft die maximale Klartext-Laenge
fn klartext_laenge_pruefen(klartext: &str) -> ChatResult<()> {
    if klartext.chars().count() > MAX_NACHRICHT_LAENGE {
        return Err(ChatError::UngueltigeEingabe(format!(
            "Nachricht zu lang: {} Zeichen (Maximum: {MAX_NACHRICHT_LAENGE})",
            klartext.chars().count()
        )));
    }
    Ok(())
}
