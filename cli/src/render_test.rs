use super::*;
use docconnect::models::{CaseComment, CaseStatus, ParticipantInfo, Qualification};
use time::macros::{date, datetime};

// =============================================================================
// CASES
// =============================================================================

#[test]
fn case_table_collapses_extra_tags() {
    let case = PatientCase {
        id: "c1".to_owned(),
        title: "Chest pain".to_owned(),
        status: CaseStatus::Open,
        poster_name: "Dr Rao".to_owned(),
        specialty_tags: ["Cardiology", "Emergency", "Radiology", "Surgery"].map(str::to_owned).to_vec(),
        ..PatientCase::default()
    };
    let out = case_table(&[case]);
    assert!(out.contains("[open] Chest pain"));
    assert!(out.contains("#Cardiology #Emergency #Radiology +1"));
}

#[test]
fn empty_lists_say_so() {
    assert_eq!(case_table(&[]), "no cases\n");
    assert_eq!(doctor_table(&[]), "no doctors\n");
    assert_eq!(event_table(&[], "me", date!(2026 - 10 - 19)), "no events\n");
}

#[test]
fn case_detail_marks_treatments_and_nests_replies() {
    let case = PatientCase { title: "Rash".to_owned(), history: "two weeks".to_owned(), ..PatientCase::default() };
    let comment = CaseComment {
        id: "k1".to_owned(),
        commenter_name: "Dr Iyer".to_owned(),
        content: "Try steroids".to_owned(),
        is_treatment_suggestion: true,
        likes: 2,
        ..CaseComment::default()
    };
    let reply = docconnect::models::CaseReply {
        user_name: "Dr Rao".to_owned(),
        content: "Agreed".to_owned(),
        ..Default::default()
    };
    let out = case_detail(&case, &[Thread { comment, replies: vec![reply] }]);
    assert!(out.contains("History:\n  two weeks"));
    assert!(!out.contains("Examination:"));
    assert!(out.contains("Dr Iyer (k1) [treatment]: Try steroids  +2/-0"));
    assert!(out.contains("    > Dr Rao: Agreed"));
}

// =============================================================================
// PEOPLE AND EVENTS
// =============================================================================

#[test]
fn doctor_row_shows_location_and_account() {
    let doctor = DoctorProfile {
        created_by: "a@x.org".to_owned(),
        full_name: "Asha Rao".to_owned(),
        specialty: "Cardiology".to_owned(),
        location_city: "Pune".to_owned(),
        location_country: "India".to_owned(),
        years_experience: Some(12),
        qualifications: vec![Qualification { degree: "MD".to_owned(), ..Qualification::default() }],
        ..DoctorProfile::default()
    };
    let out = doctor_table(&[doctor.clone()]);
    assert!(out.starts_with("AR"));
    assert!(out.contains("Pune, India, 12y"));
    assert!(out.contains("<a@x.org>"));

    let card = profile_card(&doctor, 3, 5);
    assert!(card.contains("MD"));
    assert!(card.contains("3 cases, 5 comments"));
}

#[test]
fn event_row_flags_viewer_membership() {
    let event = MedicalEvent {
        id: "e1".to_owned(),
        title: "Echo workshop".to_owned(),
        event_type: "Workshop".to_owned(),
        date: "2026-11-02".to_owned(),
        is_online: true,
        is_free: true,
        attendees: vec!["me".to_owned()],
        ..MedicalEvent::default()
    };
    let out = event_table(&[event], "me", date!(2026 - 10 - 19));
    assert!(out.contains("@ Online"));
    assert!(out.contains("1 going (free, attending)"));
}

// =============================================================================
// CHAT
// =============================================================================

#[test]
fn conversation_row_shows_other_participant_and_badge() {
    let mut conversation = Conversation {
        id: "v1".to_owned(),
        participants: vec!["me".to_owned(), "you".to_owned()],
        last_message: Some("see you".to_owned()),
        last_message_time: Some("2026-10-19T08:30:00Z".to_owned()),
        ..Conversation::default()
    };
    conversation.participant_info.insert("you".to_owned(), ParticipantInfo { name: "Dr You".to_owned(), photo: None });
    conversation.unread_count.insert("me".to_owned(), 12);

    let out = conversation_table(&[conversation], "me", datetime!(2026-10-19 12:00 UTC));
    assert!(out.contains("Dr You (9+)  08:30  see you"));
}

#[test]
fn thread_labels_own_messages_and_attachments() {
    let mine = Message {
        sender_id: "me".to_owned(),
        content: "hello".to_owned(),
        created_date: "2026-10-19T09:05:00Z".to_owned(),
        ..Message::default()
    };
    let theirs = Message {
        sender_id: "you".to_owned(),
        sender_name: "Dr You".to_owned(),
        message_type: MessageType::Image,
        file_url: Some("https://cdn/x.png".to_owned()),
        created_date: "2026-10-19T09:06:00Z".to_owned(),
        ..Message::default()
    };
    let out = thread(&[mine, theirs], "me");
    assert_eq!(out, "09:05 me: hello\n09:06 Dr You: [image] https://cdn/x.png\n");
}

#[test]
fn content_type_follows_extension() {
    assert_eq!(content_type_for("scan.JPG"), "image/jpeg");
    assert_eq!(content_type_for("report.pdf"), "application/pdf");
    assert_eq!(content_type_for("notes"), "application/octet-stream");
}
