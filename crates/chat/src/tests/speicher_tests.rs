//! Unit-Tests fuer den InMemorySpeicher

use chrono::Utc;

use fluesterpost_core::{MessageId, UserId};
use fluesterpost_crypto::{encrypt_message, schluessel_paar_generieren, NachrichtenInhalt};

use crate::storage::{InMemorySpeicher, NachrichtenSpeicher};
use crate::types::NachrichtRecord;

fn test_record(sender: UserId, empfaenger: UserId) -> NachrichtRecord {
    let paar = schluessel_paar_generieren().unwrap();
    let jetzt = Utc::now();
    NachrichtRecord {
        id: MessageId::new(),
        sender_id: sender,
        empfaenger_id: empfaenger,
        inhalt: encrypt_message("Testinhalt", &paar.public_key).unwrap(),
        bild: None,
        erstellt_am: jetzt,
        aktualisiert_am: jetzt,
    }
}

#[tokio::test]
async fn einfuegen_und_laden() {
    let speicher = InMemorySpeicher::neu();
    let record = test_record(UserId::new(), UserId::new());

    speicher.einfuegen(record.clone()).await.unwrap();
    let geladen = speicher.laden(record.id).await.unwrap().unwrap();
    assert_eq!(geladen, record);
}

#[tokio::test]
async fn laden_unbekannter_id_gibt_nichts() {
    let speicher = InMemorySpeicher::neu();
    assert!(speicher.laden(MessageId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn ersetzen_tauscht_inhalt_als_ganzes() {
    let speicher = InMemorySpeicher::neu();
    let record = test_record(UserId::new(), UserId::new());
    speicher.einfuegen(record.clone()).await.unwrap();

    let paar = schluessel_paar_generieren().unwrap();
    let neuer_inhalt = encrypt_message("Neuer Inhalt", &paar.public_key).unwrap();
    let jetzt = Utc::now();

    let ersetzt = speicher
        .ersetzen(record.id, neuer_inhalt.clone(), jetzt)
        .await
        .unwrap();
    assert!(ersetzt);

    let geladen = speicher.laden(record.id).await.unwrap().unwrap();
    assert_eq!(geladen.inhalt, neuer_inhalt);
    assert_eq!(geladen.aktualisiert_am, jetzt);
    // Erstellungszeit und Besitzer bleiben unberuehrt
    assert_eq!(geladen.erstellt_am, record.erstellt_am);
    assert_eq!(geladen.sender_id, record.sender_id);
}

#[tokio::test]
async fn ersetzen_unbekannter_id_gibt_false() {
    let speicher = InMemorySpeicher::neu();
    let ersetzt = speicher
        .ersetzen(MessageId::new(), NachrichtenInhalt::Leer, Utc::now())
        .await
        .unwrap();
    assert!(!ersetzt);
}

#[tokio::test]
async fn entfernen_ist_hart() {
    let speicher = InMemorySpeicher::neu();
    let record = test_record(UserId::new(), UserId::new());
    speicher.einfuegen(record.clone()).await.unwrap();

    assert!(speicher.entfernen(record.id).await.unwrap());
    assert!(speicher.laden(record.id).await.unwrap().is_none());
    // Zweites Entfernen: kein Eintrag mehr
    assert!(!speicher.entfernen(record.id).await.unwrap());
}

#[tokio::test]
async fn konversation_beide_richtungen() {
    let speicher = InMemorySpeicher::neu();
    let alice = UserId::new();
    let bob = UserId::new();
    let carol = UserId::new();

    speicher.einfuegen(test_record(alice, bob)).await.unwrap();
    speicher.einfuegen(test_record(bob, alice)).await.unwrap();
    speicher.einfuegen(test_record(alice, carol)).await.unwrap();

    let gespraech = speicher.konversation(alice, bob).await.unwrap();
    assert_eq!(gespraech.len(), 2);
    assert!(gespraech
        .iter()
        .all(|n| n.empfaenger_id != carol && n.sender_id != carol));
}
