//! Structured extraction of image-generation parameters.
//!
//! The text model is asked to answer with JSON only. Models still wrap the
//! answer in Markdown fences now and then, so fences are stripped before
//! parsing.

use ella_types::image::ImageProperties;

/// System instruction for image parameter extraction.
pub const IMAGE_PROPERTIES_PROMPT: &str = r#"
You are an assistant that extracts image generation properties from user input and produces a **detailed modified prompt**.

### Task:
- If the user prompt is missing or empty → return:
  {
    "statusCode": 404,
    "message": "Prompt not found"
  }

- Otherwise:
  1. Extract the following properties **from the prompt if explicitly mentioned**, otherwise use defaults:
     - response_extension → default: "png"
     - width → default: 1024
     - height → default: 1024
     - negative_prompt → default: "" (extract if user specifies what to avoid)
  2. Modify and expand the given prompt into a **detailed image generation prompt**.
     - Add details about lighting, background, style, camera view, etc., if they are missing.
     - Keep it **relevant to the original concept**.

### Examples:

#### Input:
"Generate a 512x512 jpg image of a dragon, avoid fire"
#### Output:
{
  "statusCode": 200,
  "response_extension": "jpg",
  "width": 512,
  "height": 512,
  "negative_prompt": "fire",
  "prompt": "A majestic fantasy dragon with shimmering scales, flying over ancient mountains at sunset, dramatic lighting, ultra-detailed concept art"
}

#### Input:
"dragon"
#### Output:
{
  "statusCode": 200,
  "response_extension": "png",
  "width": 1024,
  "height": 1024,
  "negative_prompt": "",
  "prompt": "A majestic fantasy dragon with intricate scales, glowing eyes, and massive wings, flying in a mystical sky with mountains and castles in the background, cinematic lighting, ultra-realistic concept art"
}

### Rules:
1. Always return **valid JSON only**, with no extra text.
2. If the user provides a short prompt (like just one word), expand it into a **rich, descriptive prompt**.
3. Detect width/height like "512x512", "1024 by 768", etc.
4. Detect image formats (jpg, jpeg, png, webp).
5. Detect negative prompts with words like "avoid", "without", "exclude".
6. The "prompt" field should always be **detailed** and **ready for image generation**.
"#;

/// Remove Markdown code fences (```` ```json ```` and ```` ``` ````) and
/// surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find("```") {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + 3..];
        if let Some(after) = rest.strip_prefix("json") {
            rest = after.trim_start();
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Parse the extraction model's raw output.
pub fn parse_image_properties(raw: &str) -> Result<ImageProperties, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let raw = "```json\n{\"statusCode\": 200}\n```";
        assert_eq!(strip_code_fences(raw), "{\"statusCode\": 200}");
    }

    #[test]
    fn test_strip_bare_fence() {
        let raw = "  ```\n{\"a\":1}\n```  ";
        assert_eq!(strip_code_fences(raw), "{\"a\":1}");
    }

    #[test]
    fn test_strip_no_fence() {
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_fenced_properties() {
        let raw = "```json\n{\"statusCode\":200,\"width\":512,\"prompt\":\"a red fox in snow, soft light\"}\n```";
        let props = parse_image_properties(raw).unwrap();
        assert_eq!(props.width, 512);
        assert_eq!(props.height, 1024);
        assert_eq!(props.response_extension, "png");
        assert_eq!(props.prompt, "a red fox in snow, soft light");
    }

    #[test]
    fn test_parse_not_found() {
        let props = parse_image_properties(r#"{"statusCode": 404, "message": "Prompt not found"}"#).unwrap();
        assert!(props.is_not_found());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_image_properties("Sure! Here is your JSON").is_err());
    }
}
