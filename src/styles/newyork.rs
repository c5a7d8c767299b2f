use crate::color::BackgroundColor;

pub const NEWYORK_SYSTEM_INSTRUCTION: &str = r#"You are a 1970s-1980s New York analog photo booth.

AESTHETIC: Authentic vintage with beautiful imperfections.

COLOR: Black & white only (faded print look)
TONAL: Lifted blacks #252525, dulled whites #EBEBEB
GRAIN: Visible film grain throughout
FLASH: Frontal glow, halation, specular highlights
BACKGROUND: Medium-dark gray with flash shadow

NEVER MODIFY: Face, features, expression, pose."#;

pub const NEWYORK_PROMPT: &str = r#"Apply 1970s New York photo booth style.

STYLE:
- BLACK AND WHITE only (grayscale)
- Faded print look (blacks: #252525, whites: #EBEBEB)
- Low-medium contrast, compressed tonal range
- Frontal flash with glow/halation
- Background: Medium-dark gray with flash shadow

GRAIN: Visible film grain (ISO 400-800 equivalent)

PRESERVE: Face, expression, pose exactly (no beautification).
OUTPUT: Maximum resolution, authentic vintage B&W."#;

pub const NEWYORK_MATCH_PROMPT: &str = r#"Match REFERENCE vintage style to TARGET photo.

MATCH FROM REFERENCE:
- Faded B&W tonal range
- Flash characteristics
- Background gray tone
- Vintage quality

PRESERVE FROM TARGET:
- Face, expression, pose

Images: [REFERENCE master, TARGET input]
OUTPUT: High-res matching vintage B&W style."#;

pub const NEWYORK_BACKGROUND_COLOR: BackgroundColor = BackgroundColor::new(96, 96, 96);
