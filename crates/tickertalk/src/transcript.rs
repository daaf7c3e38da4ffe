use crate::models::message::Message;

/// Assemble the transcript for one request.
///
/// The system instruction always comes first and the new prompt always
/// comes last. A non-empty previous reply is replayed as an assistant turn
/// between the two so the model can refine what it rendered before.
pub fn build_transcript(instruction: &str, prompt: &str, previous: Option<&str>) -> Vec<Message> {
    let mut transcript = Vec::with_capacity(3);
    transcript.push(Message::system(instruction));

    if let Some(previous) = previous.filter(|text| !text.is_empty()) {
        transcript.push(Message::assistant(previous));
    }

    transcript.push(Message::user(prompt));
    transcript
}
