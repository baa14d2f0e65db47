//! Demo network for `--offline`: a handful of doctors, cases, a discussion,
//! one conversation, and events around today's date.

use std::collections::BTreeMap;

use docconnect::models::{
    Account, CaseComment, CaseStatus, Conversation, DoctorProfile, MedicalEvent, Message, ParticipantInfo,
    PatientCase, Qualification,
};
use docconnect::store::memory::MemoryStore;
use docconnect::store::{EntityStoreExt, StoreError};
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

pub const DEMO_ACCOUNT: &str = "demo@docconnect.dev";

struct Doctor {
    email: &'static str,
    name: &'static str,
    specialty: &'static str,
    city: &'static str,
    country: &'static str,
    degree: &'static str,
    years: u32,
    responses: u32,
}

const DOCTORS: [Doctor; 5] = [
    Doctor { email: DEMO_ACCOUNT, name: "Dr. Maya Sen", specialty: "Internal Medicine", city: "Mumbai", country: "India", degree: "MD", years: 9, responses: 14 },
    Doctor { email: "arjun@docconnect.dev", name: "Dr. Arjun Mehta", specialty: "Cardiology", city: "Pune", country: "India", degree: "DM", years: 15, responses: 41 },
    Doctor { email: "lena@docconnect.dev", name: "Dr. Lena Ortiz", specialty: "Dermatology", city: "Madrid", country: "Spain", degree: "MD", years: 7, responses: 22 },
    Doctor { email: "kofi@docconnect.dev", name: "Dr. Kofi Mensah", specialty: "Pediatrics", city: "Accra", country: "Ghana", degree: "MBBS", years: 11, responses: 8 },
    Doctor { email: "hana@docconnect.dev", name: "Dr. Hana Sato", specialty: "Neurology", city: "Osaka", country: "Japan", degree: "PhD", years: 19, responses: 30 },
];

/// Sign the demo account in and fill `store` with sample records.
///
/// # Errors
///
/// Store errors from the in-memory tables.
pub async fn seed_demo(store: &MemoryStore) -> Result<(), StoreError> {
    store.sign_in(Account {
        email: DEMO_ACCOUNT.to_owned(),
        full_name: "Maya Sen".to_owned(),
        ..Account::default()
    });

    let mut profiles = Vec::new();
    for doctor in &DOCTORS {
        let profile = DoctorProfile {
            created_by: doctor.email.to_owned(),
            full_name: doctor.name.to_owned(),
            specialty: doctor.specialty.to_owned(),
            location_city: doctor.city.to_owned(),
            location_country: doctor.country.to_owned(),
            years_experience: Some(doctor.years),
            response_count: doctor.responses,
            qualifications: vec![Qualification { degree: doctor.degree.to_owned(), ..Qualification::default() }],
            ..DoctorProfile::default()
        };
        profiles.push(store.entities::<DoctorProfile>().create(&profile).await?);
    }

    let chest_pain = store
        .entities::<PatientCase>()
        .create(&PatientCase {
            created_by: "arjun@docconnect.dev".to_owned(),
            title: "Exertional chest pain with normal ECG".to_owned(),
            patient_age: Some(54),
            patient_gender: "Male".to_owned(),
            chief_complaint: "Chest tightness on climbing stairs for 3 weeks".to_owned(),
            question: "Stress test first or straight to CT angiography?".to_owned(),
            specialty_tags: vec!["Cardiology".to_owned(), "Emergency Medicine".to_owned()],
            status: CaseStatus::Open,
            poster_name: "Dr. Arjun Mehta".to_owned(),
            poster_qualifications: vec!["DM".to_owned()],
            discussion_count: 1,
            ..PatientCase::default()
        })
        .await?;
    store
        .entities::<PatientCase>()
        .create(&PatientCase {
            created_by: "lena@docconnect.dev".to_owned(),
            title: "Annular rash unresponsive to antifungals".to_owned(),
            patient_age: Some(31),
            patient_gender: "Female".to_owned(),
            chief_complaint: "Expanding ring-shaped plaques on forearms".to_owned(),
            specialty_tags: vec!["Dermatology".to_owned()],
            status: CaseStatus::Resolved,
            poster_name: "Dr. Lena Ortiz".to_owned(),
            ..PatientCase::default()
        })
        .await?;
    store
        .entities::<CaseComment>()
        .create(&CaseComment {
            created_by: "hana@docconnect.dev".to_owned(),
            case_id: chest_pain.id.clone(),
            commenter_id: "hana@docconnect.dev".to_owned(),
            commenter_name: "Dr. Hana Sato".to_owned(),
            commenter_specialty: "Neurology".to_owned(),
            content: "Given the risk profile I would go to CT angiography.".to_owned(),
            is_treatment_suggestion: true,
            likes: 2,
            liked_by: vec!["arjun@docconnect.dev".to_owned(), "kofi@docconnect.dev".to_owned()],
            ..CaseComment::default()
        })
        .await?;

    seed_conversation(store, &profiles).await?;
    seed_events(store).await
}

async fn seed_conversation(store: &MemoryStore, profiles: &[DoctorProfile]) -> Result<(), StoreError> {
    let Some(other) = profiles.iter().find(|p| p.created_by == "arjun@docconnect.dev") else {
        return Ok(());
    };
    let participant_info: BTreeMap<String, ParticipantInfo> = profiles
        .iter()
        .filter(|p| p.created_by == DEMO_ACCOUNT || p.created_by == other.created_by)
        .map(|p| (p.created_by.clone(), ParticipantInfo { name: p.full_name.clone(), photo: None }))
        .collect();
    let conversation = store
        .entities::<Conversation>()
        .create(&Conversation {
            participants: vec![DEMO_ACCOUNT.to_owned(), other.created_by.clone()],
            participant_info,
            last_message: Some("Could you take a look at my chest pain case?".to_owned()),
            last_message_sender: Some(other.created_by.clone()),
            last_message_time: Some(docconnect::services::now_rfc3339()),
            unread_count: BTreeMap::from([(DEMO_ACCOUNT.to_owned(), 1), (other.created_by.clone(), 0)]),
            ..Conversation::default()
        })
        .await?;
    store
        .entities::<Message>()
        .create(&Message {
            created_by: other.created_by.clone(),
            conversation_id: conversation.id,
            sender_id: other.created_by.clone(),
            sender_name: other.full_name.clone(),
            content: "Could you take a look at my chest pain case?".to_owned(),
            read_by: vec![other.created_by.clone()],
            ..Message::default()
        })
        .await?;
    Ok(())
}

async fn seed_events(store: &MemoryStore) -> Result<(), StoreError> {
    let today = OffsetDateTime::now_utc().date();
    let samples = [
        ("Cardiology Update Summit", "Conference", -30, false, "Pune"),
        ("Dermoscopy Hands-on", "Workshop", 10, false, "Madrid"),
        ("Pediatric Sepsis Webinar", "Webinar", 21, true, ""),
    ];
    for (title, event_type, offset, online, city) in samples {
        let date = (today + Duration::days(offset))
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default();
        store
            .entities::<MedicalEvent>()
            .create(&MedicalEvent {
                title: title.to_owned(),
                event_type: event_type.to_owned(),
                date,
                time: "09:00".to_owned(),
                is_online: online,
                is_free: online,
                location_city: city.to_owned(),
                organizer: "DocConnect".to_owned(),
                ..MedicalEvent::default()
            })
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docconnect::services;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn demo_network_is_signed_in_with_profile() {
        let store = MemoryStore::new();
        seed_demo(&store).await.unwrap();

        let session = services::session::load_session(&store).await.unwrap();
        assert_eq!(session.email(), DEMO_ACCOUNT);
        assert!(!services::session::needs_profile(&session));
        assert_eq!(services::chat::total_unread(&store, DEMO_ACCOUNT).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn demo_events_straddle_today() {
        let store = MemoryStore::new();
        seed_demo(&store).await.unwrap();

        let today = OffsetDateTime::now_utc().date();
        let upcoming = services::events::upcoming_events(&store, today).await.unwrap();
        assert_eq!(upcoming.len(), 2);
        assert_eq!(services::events::list_events(&store).await.unwrap().len(), 3);
    }
}
