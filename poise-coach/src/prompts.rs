//! Model instructions and fixed feedback texts

/// Instruction sent with the captured photo
pub const VISION_PROMPT: &str = "\
You are a strict career coach reviewing a candidate's webcam photo before a formal \
software engineering video interview.

Look at attire, grooming, posture, eye contact, camera framing, background and lighting. \
Base every remark only on what is visible in the image and make no assumptions.

Reply with 3 to 4 concise suggestions for improvement as a bulleted list, one \"- \" \
bullet per suggestion. Address the candidate directly as \"you\".";

/// Stored when the visual sub-flow fails for any reason
pub const VISUAL_FALLBACK: &str = "Visual analysis failed. Please try again with better lighting.";

/// Stored when the voice sub-flow fails for any reason
pub const VOICE_FALLBACK: &str = "Voice analysis failed. Please try recording again.";

/// Stored when the recording contains no recognizable speech
pub const NO_SPEECH_FEEDBACK: &str =
    "No speech was detected. Try speaking clearly and close to your microphone.";

/// Transcript some speech models emit for silent recordings
const NO_SPEECH_SENTINEL: &str = "no speech detected";

/// Builds the completion prompt for a transcript
pub fn voice_prompt(transcript: &str) -> String {
    format!(
        "You are a communication coach helping a candidate rehearse for a job interview. \
Below is the transcript of a short practice answer.\n\n\
Transcript:\n\"\"\"\n{}\n\"\"\"\n\n\
Give 2 to 3 concise suggestions about clarity, confidence and filler words \
(such as \"um\", \"uh\" or \"like\"). Reply only with a bulleted list, one \"- \" bullet \
per suggestion, and address the candidate directly as \"you\".",
        transcript.trim()
    )
}

/// Returns true when a transcript carries no usable speech
///
/// Blank transcripts and the "no speech detected" sentinel both count;
/// the sentinel match ignores case, surrounding whitespace and a trailing period.
pub fn is_no_speech(transcript: &str) -> bool {
    let trimmed = transcript.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_SPEECH_SENTINEL)
}
