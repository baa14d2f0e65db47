//! Plain-text tables for the terminal, built from the shared card summaries.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::fmt::Write as _;

use docconnect::cards::{
    CaseCardSummary, ChatListItemSummary, DoctorCardSummary, EventCardSummary, clock_label, full_date_label,
};
use docconnect::models::{Conversation, DoctorProfile, MedicalEvent, Message, MessageType, PatientCase};
use docconnect::services::cases::Thread;
use time::{Date, OffsetDateTime};

pub fn case_table(cases: &[PatientCase]) -> String {
    if cases.is_empty() {
        return "no cases\n".to_owned();
    }
    let mut out = String::new();
    for case in cases {
        let card = CaseCardSummary::from(case);
        let tags = tag_list(&card.tags, card.hidden_tags);
        let _ = writeln!(
            out,
            "{:<24} [{}] {}  ({}, {} comments, {} helpful){}",
            card.id,
            card.status.as_str(),
            card.title,
            card.poster_name,
            card.discussion_count,
            card.helpful_count,
            tags,
        );
    }
    out
}

fn tag_list(tags: &[String], hidden: usize) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let mut line = format!("  #{}", tags.join(" #"));
    if hidden > 0 {
        let _ = write!(line, " +{hidden}");
    }
    line
}

pub fn case_detail(case: &PatientCase, threads: &[Thread]) -> String {
    let card = CaseCardSummary::from(case);
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", card.title, card.status.as_str());
    let _ = writeln!(out, "posted by {} on {}", card.poster_name, full_date_label(&case.created_date));
    if !card.patient_line.is_empty() {
        let _ = writeln!(out, "patient: {}", card.patient_line);
    }
    let sections = [
        ("Chief complaint", &case.chief_complaint),
        ("History", &case.history),
        ("Examination", &case.examination_findings),
        ("Investigations", &case.investigations),
        ("Current treatment", &case.current_treatment),
        ("Question", &case.question),
    ];
    for (label, body) in sections {
        if !body.trim().is_empty() {
            let _ = writeln!(out, "\n{label}:\n  {}", body.trim());
        }
    }
    for url in &case.attachments {
        let _ = writeln!(out, "attachment: {url}");
    }
    let _ = writeln!(out, "\n{} comments", threads.len());
    for thread in threads {
        let c = &thread.comment;
        let marker = if c.is_treatment_suggestion { " [treatment]" } else { "" };
        let _ = writeln!(out, "- {} ({}){}: {}  +{}/-{}", c.commenter_name, c.id, marker, c.content, c.likes, c.dislikes);
        for reply in &thread.replies {
            let _ = writeln!(out, "    > {}: {}", reply.user_name, reply.content);
        }
    }
    out
}

pub fn doctor_table(doctors: &[DoctorProfile]) -> String {
    if doctors.is_empty() {
        return "no doctors\n".to_owned();
    }
    let mut out = String::new();
    for doctor in doctors {
        let card = DoctorCardSummary::from(doctor);
        let years = card.years_experience.map(|y| format!(", {y}y")).unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<4} {}  {}  {}{}  [{} responses, {} helpful]  <{}>",
            card.initials, card.name, card.specialty, card.location, years, card.response_count, card.helpful_votes, card.account,
        );
    }
    out
}

pub fn event_table(events: &[MedicalEvent], viewer: &str, today: Date) -> String {
    if events.is_empty() {
        return "no events\n".to_owned();
    }
    let mut out = String::new();
    for event in events {
        let card = EventCardSummary::new(event, viewer, today);
        let mut flags = Vec::new();
        if card.is_free {
            flags.push("free");
        }
        if card.attending {
            flags.push("attending");
        }
        if card.interested {
            flags.push("interested");
        }
        let flags = if flags.is_empty() { String::new() } else { format!(" ({})", flags.join(", ")) };
        let _ = writeln!(
            out,
            "{:<24} {} [{}] {} @ {}  {} going{}",
            card.id, card.title, card.event_type, card.when, card.place, card.attendee_count, flags,
        );
    }
    out
}

pub fn conversation_table(conversations: &[Conversation], viewer: &str, now: OffsetDateTime) -> String {
    if conversations.is_empty() {
        return "no conversations\n".to_owned();
    }
    let mut out = String::new();
    for conversation in conversations {
        let item = ChatListItemSummary::new(conversation, viewer, now);
        let badge = item.badge.map(|b| format!(" ({b})")).unwrap_or_default();
        let _ = writeln!(out, "{:<24} {}{}  {}  {}", item.conversation_id, item.name, badge, item.time, item.last_message);
    }
    out
}

/// One line per message; the viewer's own messages are prefixed with "me".
pub fn thread(messages: &[Message], viewer: &str) -> String {
    let mut out = String::new();
    for message in messages {
        let who = if message.sender_id == viewer { "me" } else { message.sender_name.as_str() };
        let body = match (message.message_type, &message.file_url) {
            (MessageType::Image, Some(url)) => format!("[image] {url}"),
            (MessageType::File, Some(url)) => format!("[file {}] {url}", message.content),
            _ => message.content.clone(),
        };
        let _ = writeln!(out, "{} {who}: {body}", clock_label(&message.created_date));
    }
    out
}

pub fn profile_card(profile: &DoctorProfile, cases: usize, comments: usize) -> String {
    let card = DoctorCardSummary::from(profile);
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", card.name, card.initials);
    if !card.specialty.is_empty() {
        let _ = writeln!(out, "{}", card.specialty);
    }
    if !card.qualifications.is_empty() {
        let _ = writeln!(out, "{}", card.qualifications);
    }
    if !card.location.is_empty() {
        let _ = writeln!(out, "{}", card.location);
    }
    if !profile.bio.trim().is_empty() {
        let _ = writeln!(out, "\n{}", profile.bio.trim());
    }
    if !profile.interests.is_empty() {
        let _ = writeln!(out, "\ninterests: {}", profile.interests.join(", "));
    }
    let _ = writeln!(out, "\n{cases} cases, {comments} comments, {} helpful votes", card.helpful_votes);
    out
}

/// Guess an upload's content type from its file extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
