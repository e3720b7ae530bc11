use std::fmt::Write as _;

use client_core::{Phase, ServiceError, Session};
use shared::domain::STANDARD_DECK_SIZE;

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Initializing => "shuffling...",
        Phase::Ready => "ready",
        Phase::Drawing => "drawing...",
    }
}

pub fn render_session(session: &Session) -> String {
    let mut out = String::new();
    let deck = session
        .deck_id
        .as_ref()
        .map_or_else(|| "no deck".to_string(), |id| format!("deck {id}"));
    let _ = writeln!(
        out,
        "== {deck} | {}/{STANDARD_DECK_SIZE} cards left | {}",
        session.remaining,
        phase_label(session.phase)
    );

    if session.history.is_empty() {
        out.push_str("   (no cards drawn)\n");
    }
    for (index, card) in session.history.iter().enumerate() {
        let marker = if session.selected_index == Some(index) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            " {marker} [{index}] {:<20} {} {}",
            card.label(),
            card.code,
            card.drawn_at_local()
        );
    }

    if let Some(card) = session.selected_card() {
        let _ = writeln!(out, "   selected: {} ({})", card.label(), card.image);
    }
    out
}

pub fn render_error(err: &ServiceError) -> String {
    match err {
        ServiceError::Transport(_) => format!("!! deck service unreachable: {err}"),
        ServiceError::Rejected(_) => format!("!! deck service refused: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use client_core::DrawnCard;
    use shared::{domain::DeckId, protocol::CardImages};

    fn card(code: &str, value: &str) -> DrawnCard {
        DrawnCard {
            code: code.into(),
            suit: "SPADES".into(),
            value: value.into(),
            image: format!("https://img.test/{code}.png"),
            images: CardImages {
                svg: format!("https://img.test/{code}.svg"),
                png: format!("https://img.test/{code}.png"),
            },
            drawn_at: Utc::now(),
        }
    }

    #[test]
    fn renders_fresh_session() {
        let text = render_session(&Session::default());
        assert!(text.contains("no deck"), "{text}");
        assert!(text.contains("52/52 cards left"), "{text}");
        assert!(text.contains("shuffling..."), "{text}");
        assert!(text.contains("(no cards drawn)"), "{text}");
    }

    #[test]
    fn marks_selected_entry_and_shows_its_image() {
        let session = Session {
            deck_id: Some(DeckId::new("abc")),
            history: vec![card("KS", "KING"), card("AS", "ACE")],
            selected_index: Some(1),
            remaining: 50,
            phase: Phase::Ready,
        };

        let text = render_session(&session);
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].contains("deck abc"));
        assert!(lines[1].starts_with("   [0] KING of SPADES"), "{text}");
        assert!(lines[2].starts_with(" > [1] ACE of SPADES"), "{text}");
        assert!(text.contains("selected: ACE of SPADES (https://img.test/AS.png)"));
    }

    #[test]
    fn error_lines_name_the_failure_kind() {
        let text = render_error(&ServiceError::Transport("timed out".into()));
        assert!(text.contains("unreachable"));
        assert!(text.contains("timed out"));
        assert!(render_error(&ServiceError::Rejected("gone".into())).contains("refused"));
    }
}
