use image::{Rgba, RgbaImage};
use paturage_kernel::Breed;
use paturage_render::MeshKind;
use std::path::Path;

/// Size of the generated fallback textures.
const FALLBACK_SIZE: u32 = 64;

/// File name looked up in the texture directory for a mesh.
pub fn texture_file_name(mesh: MeshKind) -> String {
    match mesh {
        MeshKind::Ground => "paturage.png".into(),
        MeshKind::Shadow => "shadow.png".into(),
        MeshKind::Cow(breed) => format!("{}.png", breed.texture_stem()),
    }
}

/// Load the texture for `mesh` from `dir`, or generate one when there is no
/// directory or the file cannot be read.
pub fn load_image(dir: Option<&Path>, mesh: MeshKind) -> RgbaImage {
    let Some(dir) = dir else {
        return fallback_image(mesh);
    };

    let path = dir.join(texture_file_name(mesh));
    match image::open(&path) {
        Ok(img) => {
            tracing::debug!(path = %path.display(), "texture loaded");
            img.to_rgba8()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "texture unavailable, using generated one: {e}");
            fallback_image(mesh)
        }
    }
}

/// Generated texture for a mesh.
pub fn fallback_image(mesh: MeshKind) -> RgbaImage {
    let size = FALLBACK_SIZE;
    match mesh {
        MeshKind::Ground => RgbaImage::from_fn(size, size, |x, y| {
            // Two tones of grass in broad diagonal bands.
            if (x + y) / 8 % 2 == 0 {
                Rgba([88, 150, 62, 255])
            } else {
                Rgba([78, 138, 55, 255])
            }
        }),
        MeshKind::Shadow => RgbaImage::from_fn(size, size, |x, y| {
            // Soft disc fading out toward the edge.
            let half = size as f32 / 2.0;
            let dx = (x as f32 + 0.5 - half) / half;
            let dy = (y as f32 + 0.5 - half) / half;
            let d = (dx * dx + dy * dy).sqrt();
            let alpha = ((1.0 - d) * 2.0).clamp(0.0, 1.0);
            Rgba([0, 0, 0, (alpha * 200.0) as u8])
        }),
        MeshKind::Cow(breed) => RgbaImage::from_fn(size, size, |x, y| coat(breed, x, y)),
    }
}

fn coat(breed: Breed, x: u32, y: u32) -> Rgba<u8> {
    match breed {
        Breed::Holstein => {
            // Black patches on white.
            let patch = ((x / 16) * 7 + (y / 16) * 3) % 5 < 2;
            if patch {
                Rgba([25, 25, 25, 255])
            } else {
                Rgba([240, 240, 235, 255])
            }
        }
        Breed::Jersey => {
            let shade = ((x + y) % 16) as u8;
            Rgba([160 + shade, 105 + shade / 2, 60, 255])
        }
        Breed::BlancBleuBelge => {
            // Blue-grey roan: speckles on white.
            if (x * 13 + y * 7) % 5 == 0 {
                Rgba([95, 105, 125, 255])
            } else {
                Rgba([225, 228, 235, 255])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(texture_file_name(MeshKind::Ground), "paturage.png");
        assert_eq!(texture_file_name(MeshKind::Shadow), "shadow.png");
        assert_eq!(
            texture_file_name(MeshKind::Cow(Breed::BlancBleuBelge)),
            "bbb.png"
        );
    }

    #[test]
    fn fallback_without_directory() {
        let img = load_image(None, MeshKind::Cow(Breed::Jersey));
        assert_eq!(img.dimensions(), (FALLBACK_SIZE, FALLBACK_SIZE));
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let img = load_image(Some(dir.path()), MeshKind::Ground);
        assert_eq!(img, fallback_image(MeshKind::Ground));
    }

    #[test]
    fn loads_png_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let custom = RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255]));
        custom.save(dir.path().join("holstein.png")).unwrap();

        let img = load_image(Some(dir.path()), MeshKind::Cow(Breed::Holstein));
        assert_eq!(img, custom);
    }

    #[test]
    fn shadow_fades_to_transparent_edges() {
        let img = fallback_image(MeshKind::Shadow);
        let centre = img.get_pixel(FALLBACK_SIZE / 2, FALLBACK_SIZE / 2)[3];
        let corner = img.get_pixel(0, 0)[3];
        assert!(centre > 150);
        assert_eq!(corner, 0);
    }
}
