use crate::color::BackgroundColor;

pub const PURIKURA_SYSTEM_INSTRUCTION: &str = "";

pub const PURIKURA_PROMPT: &str = r#"Transform this photo into an authentic Japanese Purikura photo, exactly as produced by a modern FuRyu arcade photo booth.

[STYLE TRANSFORMATIONS]

1. EYES (Anime / Dolly Enhancement)
- Enlarge both eyes by 120-135% (vertical and horizontal)
- Round out the eye shape and soften the outer corners
- Widen irises, darken limbal rings, add 4-6 sparkle highlights (white to light blue)
- Emphasize namidabukuro (tear bags) with soft pink shadowing (#FFD5E5)
- Keep both eyes symmetric and looking in the same direction as the original

2. SKIN (Marshmallow / Mochi Texture)
- 100% smoothing: remove pores, blemishes, moles and uneven texture
- Porcelain finish with a soft-focus glow
- Shift undertones cooler (less yellow, more pink) and brighten by 20-30%
- Igari-style blush (#FFB7B2) high on the cheekbones directly below the eyes, 40-60% opacity, diffuse edges

3. FACE SHAPE (Kogao / Small Face)
- V-line jaw tapering from ear to chin
- Shorten the chin by 10-15%
- Narrow the face by 8-12%
- All reshaping must flow AROUND the mouth, never through it

4. HAIR
- Silky texture with natural gloss highlights
- Keep the original hair color, length, parting and style

5. LIGHTING
- Bright commercial beauty-studio flash
- Crisp highlights, moderate contrast, vibrant colors

6. BACKGROUND
- Replace the entire background with PURE WHITE (#FFFFFF)
- Solid and uniform: no gradients, shadows, textures or objects
- Clean edges between the subjects and the white background

[ABSOLUTE PRESERVATION RULES]
These override every transformation above. If any instruction conflicts with these rules, these rules win.
- MOUTH: identical shape, size, aperture (open/closed) and corner direction
- TEETH: visible teeth stay visible, hidden teeth stay hidden
- EXPRESSION: the exact same emotion; never add or remove a smile
- POSE: identical head tilt, body positions, hand gestures and spacing between people
- EYEBROWS: identical angle, arch and position (only darkness may change)
- IDENTITY: every person must remain clearly recognizable as themselves
- COUNT: the same number of people, nobody added or removed
- CLOTHING: the same garments, colors, text and logos

[QUALITY CHECK]
Before returning the image, confirm every item. If any item fails, redo the transformation.
- Mouth aperture and teeth visibility match the original
- Expression and pose match the original
- Eyebrow angles are within 5 degrees of the original
- Eyes are clearly enlarged with sparkle highlights and tear bags
- Skin is fully smooth with visible pink blush
- Background is pure white (#FFFFFF) edge to edge
- Output is high resolution and sharp, with no artifacts, text or watermarks

OUTPUT: A single high-resolution Purikura photo with a pure white background."#;

pub const PURIKURA_CHAT_PROMPT: &str = "";

pub const PURIKURA_BACKGROUND_COLOR: BackgroundColor = BackgroundColor {
    red: 255,
    green: 255,
    blue: 255,
};

pub const PURIKURA_MATCH_PROMPT: &str = r#"Apply the IDENTICAL Purikura style from the REFERENCE image to the TARGET photo.

MATCH FROM REFERENCE EXACTLY:
- Eye enlargement scale, sparkle style and tear bags
- Skin smoothness, tone and blush color/placement
- Face slimming and V-line jaw
- Lighting, brightness and color treatment
- PURE WHITE background (#FFFFFF), no gradients or colors

PRESERVE FROM TARGET (IMMUTABLE):
- Mouth state (open/closed, teeth visibility)
- Expression emotion exactly
- Pose, hand gestures, body positions
- Eyebrow angles (within 5 degrees)

IMAGE ORDER:
- Image 1: REFERENCE (master style with white background)
- Image 2: TARGET (to transform)

OUTPUT: High resolution, white background, matching the reference style perfectly."#;
