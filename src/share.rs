//! Builds the shareable text summary of a workout. The actual transport is a
//! platform messaging service outside this crate; the TUI shows the composed
//! text (and its segment split) for the user to copy out.

use crate::models::{Exercise, Workout};

/// Single-segment limit for a plain text message.
pub const SINGLE_SEGMENT_LIMIT: usize = 160;
/// Per-segment capacity once a multipart header is reserved.
const MULTIPART_SEGMENT_LIMIT: usize = 153;

/// Format a workout, its ordered exercises, and the unique equipment names as
/// a plain-text summary. Empty sections are omitted entirely.
pub fn format_workout_message(
    workout: &Workout,
    exercises: &[Exercise],
    equipment_names: &[String],
) -> String {
    let mut message = String::new();

    message.push_str("Workout: ");
    message.push_str(&workout.name);
    message.push_str("\n\n");

    if !equipment_names.is_empty() {
        message.push_str("Equipment Needed:\n");
        for name in equipment_names {
            message.push_str("- ");
            message.push_str(name);
            message.push('\n');
        }
        message.push('\n');
    }

    if !exercises.is_empty() {
        message.push_str("Exercises:\n");
        for (i, exercise) in exercises.iter().enumerate() {
            message.push_str(&format!(
                "{}. {} - {}\n",
                i + 1,
                exercise.name,
                exercise.sets_reps()
            ));
        }
        message.push('\n');
    }

    message.push_str("Let's train together!");
    message
}

/// Split a message into sendable segments. Anything within the single-segment
/// limit goes out whole; longer texts are cut into multipart chunks, never
/// splitting inside a UTF-8 code point.
pub fn divide_message(message: &str) -> Vec<String> {
    if message.chars().count() <= SINGLE_SEGMENT_LIMIT {
        return vec![message.to_string()];
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in message.chars() {
        current.push(ch);
        count += 1;
        if count == MULTIPART_SEGMENT_LIMIT {
            segments.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Exercise, Workout};

    fn workout(name: &str) -> Workout {
        Workout {
            id: 1,
            user_id: 1,
            name: name.to_string(),
            description: None,
            image_path: None,
            created_at: 0,
            updated_at: 0,
            is_completed: false,
        }
    }

    fn exercise(name: &str, sets: i64, reps: i64) -> Exercise {
        Exercise {
            id: 0,
            workout_id: 1,
            name: name.to_string(),
            sets,
            reps,
            instructions: None,
            is_completed: false,
            order_index: 0,
        }
    }

    #[test]
    fn full_message_layout() {
        let message = format_workout_message(
            &workout("Leg Day"),
            &[exercise("Squat", 5, 5), exercise("Lunge", 3, 12)],
            &["Barbell".to_string(), "Rack".to_string()],
        );

        assert_eq!(
            message,
            "Workout: Leg Day\n\n\
             Equipment Needed:\n- Barbell\n- Rack\n\n\
             Exercises:\n1. Squat - 5x5\n2. Lunge - 3x12\n\n\
             Let's train together!"
        );
    }

    #[test]
    fn empty_sections_are_omitted() {
        let message = format_workout_message(&workout("Rest Day"), &[], &[]);
        assert_eq!(message, "Workout: Rest Day\n\nLet's train together!");
    }

    #[test]
    fn short_message_is_one_segment() {
        let segments = divide_message("short message");
        assert_eq!(segments, vec!["short message".to_string()]);
    }

    #[test]
    fn boundary_message_stays_whole() {
        let message = "x".repeat(SINGLE_SEGMENT_LIMIT);
        assert_eq!(divide_message(&message).len(), 1);
    }

    #[test]
    fn long_message_splits_and_reassembles() {
        let message = "abcdefghij".repeat(40);
        let segments = divide_message(&message);
        assert!(segments.len() > 1);
        assert!(segments.iter().all(|s| s.chars().count() <= 153));
        assert_eq!(segments.concat(), message);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let message = "ü".repeat(200);
        let segments = divide_message(&message);
        assert_eq!(segments.concat(), message);
        assert!(segments.iter().all(|s| s.chars().count() <= 153));
    }
}
