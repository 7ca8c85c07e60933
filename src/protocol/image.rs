//! Image batches and channel normalisation.

use ndarray::{Array2, Array3, Array4, ArrayD, Axis, Ix2, Ix3};
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};

const RGB_CHANNELS: usize = 3;

/// How images are brought into channel-first `(C, H, W)` form before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// Replicate greyscale and single-channel images to three channels.
    /// Images with any channel count other than 1 or 3 are rejected.
    #[default]
    Rgb,
    /// Only add the channel axis to `(H, W)` images; channel counts are left alone.
    Passthrough,
}

impl ChannelMode {
    /// Normalise image `index` of a batch according to this mode.
    pub fn normalize(self, index: usize, image: ArrayD<u8>) -> Result<Array3<u8>> {
        let shape = image.shape().to_vec();
        let invalid = || AdapterError::InvalidImageShape {
            index,
            shape: shape.clone(),
        };

        let chw = match image.ndim() {
            2 => image
                .into_dimensionality::<Ix2>()
                .map_err(|_| invalid())?
                .insert_axis(Axis(0)),
            3 => image.into_dimensionality::<Ix3>().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };

        match self {
            ChannelMode::Passthrough => Ok(chw),
            ChannelMode::Rgb => match chw.dim() {
                (RGB_CHANNELS, _, _) => Ok(chw),
                (1, h, w) => chw
                    .broadcast((RGB_CHANNELS, h, w))
                    .map(|view| view.to_owned())
                    .ok_or_else(invalid),
                _ => Err(invalid()),
            },
        }
    }
}

/// An ordered batch of images.
///
/// Images are 2-D `(H, W)` greyscale or 3-D channel-first `(C, H, W)` arrays.
/// Greyscale and colour images may be mixed in one batch.
#[derive(Debug, Clone, Default)]
pub struct ImageBatch {
    images: Vec<ArrayD<u8>>,
}

impl ImageBatch {
    pub fn new(images: Vec<ArrayD<u8>>) -> Self {
        Self { images }
    }

    /// Split an array whose first axis is the batch dimension into its images.
    ///
    /// A 4-D `(B, C, H, W)` array yields colour images and a 3-D `(B, H, W)`
    /// array yields greyscale images.
    pub fn from_stacked(stack: ArrayD<u8>) -> Self {
        if stack.ndim() == 0 {
            // Not splittable; kept whole so normalisation reports the shape.
            return Self::new(vec![stack]);
        }
        let images = stack
            .axis_iter(Axis(0))
            .map(|image| image.to_owned())
            .collect();
        Self { images }
    }

    /// Split a `(B, C, H, W)` stack into `B` colour images.
    pub fn stacked_colour(stack: Array4<u8>) -> Self {
        Self::from_stacked(stack.into_dyn())
    }

    /// Split a `(B, H, W)` stack into `B` greyscale images.
    ///
    /// To submit a single `(C, H, W)` colour image, wrap it in a `Vec`
    /// instead; this constructor treats its first axis as the batch.
    pub fn stacked_greyscale(stack: Array3<u8>) -> Self {
        Self::from_stacked(stack.into_dyn())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArrayD<u8>> {
        self.images.iter()
    }

    pub fn push<D: ndarray::Dimension>(&mut self, image: ndarray::Array<u8, D>) {
        self.images.push(image.into_dyn());
    }

    /// Normalise every image, failing on the first invalid one.
    pub fn normalize(self, mode: ChannelMode) -> Result<Vec<Array3<u8>>> {
        self.images
            .into_iter()
            .enumerate()
            .map(|(index, image)| mode.normalize(index, image))
            .collect()
    }
}

impl IntoIterator for ImageBatch {
    type Item = ArrayD<u8>;
    type IntoIter = std::vec::IntoIter<ArrayD<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}

impl From<Vec<ArrayD<u8>>> for ImageBatch {
    fn from(images: Vec<ArrayD<u8>>) -> Self {
        Self::new(images)
    }
}

impl From<Vec<Array2<u8>>> for ImageBatch {
    fn from(images: Vec<Array2<u8>>) -> Self {
        Self::new(images.into_iter().map(|image| image.into_dyn()).collect())
    }
}

impl From<Vec<Array3<u8>>> for ImageBatch {
    fn from(images: Vec<Array3<u8>>) -> Self {
        Self::new(images.into_iter().map(|image| image.into_dyn()).collect())
    }
}

/// Same as `ImageBatch::stacked_colour`.
impl From<Array4<u8>> for ImageBatch {
    fn from(stack: Array4<u8>) -> Self {
        Self::stacked_colour(stack)
    }
}

/// Same as `ImageBatch::stacked_greyscale`: a `(3, H, W)` array becomes three
/// greyscale images, not one colour image.
impl From<Array3<u8>> for ImageBatch {
    fn from(stack: Array3<u8>) -> Self {
        Self::stacked_greyscale(stack)
    }
}

impl FromIterator<ArrayD<u8>> for ImageBatch {
    fn from_iter<T: IntoIterator<Item = ArrayD<u8>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
