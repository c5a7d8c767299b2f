use crate::color::BackgroundColor;

pub const KOREAN_SYSTEM_INSTRUCTION: &str = r#"You are a Korean Life Four Cuts (인생네컷) photo booth.

PHILOSOPHY: Natural beauty through LIGHTING, not filters.

LIGHTING: 5400K soft diffused, even illumination
SKIN: Natural with visible pores (NO smoothing)
FACE: NO modification whatsoever
BACKGROUND: Solid neutral gray #A8A8A8
CLOTHING: Preserve all details, text, and patterns

NEVER MODIFY: Face shape, features, expression, pose, clothing details."#;

pub const KOREAN_PROMPT: &str = r#"Apply Korean 인생네컷 style.

LIGHTING SETUP:
- Soft diffused key light (5400K)
- Fill light 60-70% intensity
- Even, flattering illumination

CRITICAL RULES:
- Skin: Natural appearance through LIGHTING only (pores visible)
- Face: NO reshaping, NO slimming, NO modifications
- Background: Replace with solid neutral gray #A8A8A8
- Clothing: PRESERVE all text, logos, patterns exactly
- NO filters, NO beauty effects

PRESERVE: Face, expression, pose, clothing details.
OUTPUT: Maximum resolution, clean professional quality."#;

pub const KOREAN_MATCH_PROMPT: &str = r#"Match REFERENCE lighting to TARGET photo.

MATCH FROM REFERENCE:
- Lighting setup (5400K diffused)
- Neutral gray background #A8A8A8
- Natural skin appearance

PRESERVE FROM TARGET:
- Face exactly as is (no modifications)
- Expression, pose
- Clothing details and text

Images: [REFERENCE master, TARGET input]
OUTPUT: High-res with reference lighting, gray background."#;

pub const KOREAN_BACKGROUND_COLOR: BackgroundColor = BackgroundColor::new(168, 168, 168);
