//! MTL (material library) parser.

use std::io::{self, BufRead};

use anyhow::{Context, Result, anyhow};

use crate::text::lossy_lines;

/// One `newmtl` block as written in the file. Texture paths are kept
/// relative to the library; the source resolves and decodes them.
#[derive(Clone, Debug, PartialEq)]
pub struct MtlMaterial {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
    pub diffuse_map: Option<String>,
}

impl MtlMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ambient: [0.0; 3],
            diffuse: [1.0; 3],
            specular: [0.0; 3],
            shininess: 30.0,
            opacity: 1.0,
            diffuse_map: None,
        }
    }
}

pub fn load_mtl_from_reader<R: BufRead>(reader: R) -> Result<Vec<MtlMaterial>> {
    parse_mtl(reader)
}

pub fn load_mtl_from_str(contents: &str) -> Result<Vec<MtlMaterial>> {
    parse_mtl(io::Cursor::new(contents))
}

fn parse_mtl<R: BufRead>(reader: R) -> Result<Vec<MtlMaterial>> {
    let mut materials: Vec<MtlMaterial> = Vec::new();

    for (line_no, line) in lossy_lines(reader).enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else { continue };

        if tag == "newmtl" {
            let name = trimmed[tag.len()..].trim();
            if name.is_empty() {
                anyhow::bail!("Unnamed material on line {}", line_no + 1);
            }
            materials.push(MtlMaterial::new(name));
            continue;
        }

        let Some(current) = materials.last_mut() else {
            log::debug!("MTL line {} before any newmtl ignored: '{}'", line_no + 1, trimmed);
            continue;
        };

        match tag {
            "Ka" => current.ambient = parse_rgb(&mut parts, line_no, "Ka")?,
            "Kd" => current.diffuse = parse_rgb(&mut parts, line_no, "Kd")?,
            "Ks" => current.specular = parse_rgb(&mut parts, line_no, "Ks")?,
            "Ns" => current.shininess = parse_f32(parts.next(), line_no, "Ns")?,
            "d" => current.opacity = parse_f32(parts.next(), line_no, "d")?.clamp(0.0, 1.0),
            "Tr" => {
                current.opacity = (1.0 - parse_f32(parts.next(), line_no, "Tr")?).clamp(0.0, 1.0)
            }
            "map_Kd" => {
                let file = texture_file_name(parts.collect());
                if file.is_none() {
                    anyhow::bail!("map_Kd without a file name on line {}", line_no + 1);
                }
                current.diffuse_map = file;
            }
            _ => {
                // illum, Ke, Ni, bump maps: not used by the viewer.
            }
        }
    }

    Ok(materials)
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> Result<f32> {
    let token = value.ok_or_else(|| anyhow!("Missing {} value on line {}", what, line_no + 1))?;
    token
        .parse::<f32>()
        .with_context(|| format!("Failed to parse {} on line {}", what, line_no + 1))
}

/// `Kd r [g b]`; a single component is replicated.
fn parse_rgb<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
    what: &str,
) -> Result<[f32; 3]> {
    let r = parse_f32(parts.next(), line_no, what)?;
    match parts.next() {
        None => Ok([r; 3]),
        Some(g) => {
            let g = parse_f32(Some(g), line_no, what)?;
            let b = parse_f32(parts.next(), line_no, what)?;
            Ok([r, g, b])
        }
    }
}

/// Skip `-option args...` prefixes and join the rest, so file names with
/// spaces survive.
fn texture_file_name(tokens: Vec<&str>) -> Option<String> {
    let mut i = 0;
    while i < tokens.len() && tokens[i].starts_with('-') {
        let option = tokens[i];
        i += 1;
        let max_args = match option {
            "-o" | "-s" | "-t" => 3,
            "-mm" => 2,
            _ => 1,
        };
        let mut taken = 0;
        while taken < max_args && i < tokens.len() && is_option_arg(option, tokens[i]) {
            i += 1;
            taken += 1;
        }
    }
    let rest = tokens[i..].join(" ");
    (!rest.is_empty()).then_some(rest)
}

fn is_option_arg(option: &str, token: &str) -> bool {
    if token.parse::<f32>().is_ok() || token == "on" || token == "off" {
        return true;
    }
    option == "-imfchan" && matches!(token, "r" | "g" | "b" | "m" | "l" | "z")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAT_MTL: &str = "\
# 3ds Max Wavefront OBJ Exporter
newmtl Cat_v1
\tNs 10.0000
\td 1.0000
\tTr 0.0000
\tillum 2
\tKa 0.5882 0.5882 0.5882
\tKd 0.5882 0.5882 0.5882
\tKs 0.0000 0.0000 0.0000
\tmap_Kd Cat_diffuse.jpg
";

    #[test]
    fn parses_exporter_output() {
        let mats = load_mtl_from_str(CAT_MTL).expect("parse mtl");
        assert_eq!(mats.len(), 1);
        let m = &mats[0];
        assert_eq!(m.name, "Cat_v1");
        assert_eq!(m.shininess, 10.0);
        assert_eq!(m.opacity, 1.0);
        assert_eq!(m.diffuse, [0.5882; 3]);
        assert_eq!(m.specular, [0.0; 3]);
        assert_eq!(m.diffuse_map.as_deref(), Some("Cat_diffuse.jpg"));
    }

    #[test]
    fn multiple_materials_keep_their_own_values() {
        let src = "newmtl a\nKd 1 0 0\nnewmtl b\nKd 0.5\nTr 0.25\n";
        let mats = load_mtl_from_str(src).expect("parse mtl");
        assert_eq!(mats[0].diffuse, [1.0, 0.0, 0.0]);
        assert_eq!(mats[1].diffuse, [0.5; 3]);
        assert!((mats[1].opacity - 0.75).abs() < 1e-6);
        assert_eq!(mats[0].opacity, 1.0);
    }

    #[test]
    fn texture_options_are_skipped() {
        assert_eq!(
            texture_file_name(vec!["-s", "1", "1", "1", "-clamp", "on", "fur", "map.png"]),
            Some("fur map.png".to_owned())
        );
        assert_eq!(
            texture_file_name(vec!["-imfchan", "r", "mask.png"]),
            Some("mask.png".to_owned())
        );
        assert_eq!(texture_file_name(vec!["-bm", "0.5"]), None);
    }

    #[test]
    fn latin1_material_name_is_kept_lossily() {
        let src: &[u8] = b"newmtl Gato_cer\xE1mica\nKd 1 1 1\n";
        let mats = load_mtl_from_reader(src).expect("parse latin-1 mtl");
        assert_eq!(mats[0].name, "Gato_cer\u{FFFD}mica");
        assert_eq!(mats[0].diffuse, [1.0; 3]);
    }

    #[test]
    fn bad_colour_is_an_error() {
        let err = load_mtl_from_str("newmtl a\nKd red\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
