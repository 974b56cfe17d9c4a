const HAZARD_CHECKLIST: &str = "\
Analyze this frame and determine if any of these specific dangerous situations are occurring:

1. Medical Emergencies:
- Person unconscious or lying motionless
- Person clutching chest/showing signs of heart problems
- Seizures or convulsions
- Difficulty breathing or choking

2. Falls and Injuries:
- Person falling or about to fall
- Person on the ground after a fall
- Signs of injury or bleeding
- Limping or showing signs of physical trauma

3. Distress Signals:
- Person calling for help or showing distress
- Panic attacks or severe anxiety symptoms
- Signs of fainting or dizziness
- Headache or unease
- Signs of unconsciousness

4. Violence or Threats:
- Physical altercations
- Threatening behavior
- Weapons visible

5. Suspicious Activities:
- Shoplifting
- Vandalism
- Trespassing
";

const RESPONSE_SHAPE: &str = r#"
Return a JSON object in this exact format:

{
    "events": [
        {
            "timestamp": "mm:ss",
            "description": "Brief description of what's happening in this frame",
            "isDangerous": true/false // Set to true if the event involves a fall, injury, unease, pain, accident, or concerning behavior
        }
    ]
}"#;

/// Instruction sent alongside each frame. A non-blank transcript is quoted in.
pub fn build_prompt(transcript: &str) -> String {
    let transcript = transcript.trim();
    let mut prompt = String::with_capacity(
        HAZARD_CHECKLIST.len() + RESPONSE_SHAPE.len() + transcript.len() + 64,
    );
    prompt.push_str(HAZARD_CHECKLIST);
    if !transcript.is_empty() {
        prompt.push_str("Consider this audio transcript from the scene: \"");
        prompt.push_str(transcript);
        prompt.push_str("\"\n");
    }
    prompt.push_str(RESPONSE_SHAPE);
    prompt
}
