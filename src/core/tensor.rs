use image::RgbImage;
use ndarray::Array3;

/// Convert an RGB image into a `(3, height, width)` tensor scaled to `[0, 1]`.
pub fn to_chw_tensor(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    Array3::from_shape_fn((3, height as usize, width as usize), |(c, y, x)| {
        f32::from(image.get_pixel(x as u32, y as u32)[c]) / 255.0
    })
}
