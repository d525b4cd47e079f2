//! Conversions between the stored mask convention and the in-editor one.
//!
//! On disk a mask is opaque black where the image is kept and transparent
//! where it is masked. The editor shows the opposite: painted pixels are
//! the masked region. Both directions flip alpha (255 becomes 0, anything
//! else becomes 255) and overwrite the color channels, so converting a
//! binary mask there and back is the identity.

use rayon::prelude::*;

use crate::surface::Surface;

/// Flip alpha and force the color channels to `rgb` in place.
pub fn invert_alpha(pixels: &mut [u8], rgb: [u8; 3]) {
    pixels.par_chunks_exact_mut(4).for_each(|px| {
        px[0] = rgb[0];
        px[1] = rgb[1];
        px[2] = rgb[2];
        px[3] = if px[3] == 255 { 0 } else { 255 };
    });
}

/// Turn a freshly loaded stored mask into its editor form.
pub fn to_editor(surface: &mut Surface, mask_rgb: [u8; 3]) {
    invert_alpha(&mut surface.pixels, mask_rgb);
}

/// Produce the stored form of an editor mask, with color channels zeroed.
pub fn to_storage(surface: &Surface) -> Surface {
    let mut out = surface.clone();
    invert_alpha(&mut out.pixels, [0, 0, 0]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inversion_flips_binary_alpha() {
        let mut px = vec![10, 20, 30, 255, 40, 50, 60, 0];
        invert_alpha(&mut px, [1, 2, 3]);
        assert_eq!(px, vec![1, 2, 3, 0, 1, 2, 3, 255]);
    }

    #[test]
    fn partial_alpha_becomes_opaque() {
        let mut px = vec![0, 0, 0, 128];
        invert_alpha(&mut px, [0, 0, 0]);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn stored_mask_survives_editor_round_trip() {
        let mut stored = Surface::filled(4, 4, [0, 0, 0, 255]);
        for i in [0usize, 5, 10, 15] {
            stored.pixels[i * 4 + 3] = 0;
        }
        let mut editor = stored.clone();
        to_editor(&mut editor, [255, 0, 0]);
        assert_eq!(editor.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(editor.pixel(1, 0), Some([255, 0, 0, 0]));
        assert_eq!(to_storage(&editor), stored);
    }
}
