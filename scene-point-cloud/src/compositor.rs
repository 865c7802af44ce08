/// Composition of sampled points and actor appearance into fixed-width records.
use crate::config::{ConversionConfig, LightColorMode, MaterialColorMode};
use crate::error::ConvertError;
use crate::scene::{Appearance, Color};
use constants::channel::{
    LIGHT_GREY_PROPERTY, LIGHT_INTENSITY_PROPERTY, LIGHT_RGBA_PROPERTIES, MATERIAL_GREY_PROPERTY,
    MATERIAL_RGBA_PROPERTIES, RENDERED_PROPERTY, luma,
};
use glam::DVec3;

/// Ordered channel schema appended after x, y, z:
/// material channels, light channels, then the rendered weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub material: MaterialColorMode,
    pub light: LightColorMode,
}

impl ChannelLayout {
    pub fn new(material: MaterialColorMode, light: LightColorMode) -> Self {
        Self { material, light }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.material_color, config.light_color)
    }

    /// Property names of the non-position channels, in record order.
    pub fn property_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(10);

        match self.material {
            MaterialColorMode::Rgba => names.extend(MATERIAL_RGBA_PROPERTIES),
            MaterialColorMode::GreyScale => names.push(MATERIAL_GREY_PROPERTY),
            MaterialColorMode::Rgb => names.extend(&MATERIAL_RGBA_PROPERTIES[..3]),
        }

        match self.light {
            LightColorMode::Rgbai => {
                names.extend(LIGHT_RGBA_PROPERTIES);
                names.push(LIGHT_INTENSITY_PROPERTY);
            }
            LightColorMode::Rgba => names.extend(LIGHT_RGBA_PROPERTIES),
            LightColorMode::Rgbi => {
                names.extend(&LIGHT_RGBA_PROPERTIES[..3]);
                names.push(LIGHT_INTENSITY_PROPERTY);
            }
            LightColorMode::Rgb => names.extend(&LIGHT_RGBA_PROPERTIES[..3]),
            LightColorMode::GreyScale => names.push(LIGHT_GREY_PROPERTY),
            LightColorMode::Intensity => names.push(LIGHT_INTENSITY_PROPERTY),
        }

        names.push(RENDERED_PROPERTY);
        names
    }

    /// Number of channels after x, y, z.
    pub fn attribute_count(&self) -> usize {
        let material = match self.material {
            MaterialColorMode::Rgba => 4,
            MaterialColorMode::GreyScale => 1,
            MaterialColorMode::Rgb => 3,
        };
        let light = match self.light {
            LightColorMode::Rgbai => 5,
            LightColorMode::Rgba | LightColorMode::Rgbi => 4,
            LightColorMode::Rgb => 3,
            LightColorMode::GreyScale | LightColorMode::Intensity => 1,
        };
        material + light + 1
    }

    /// Append one point's channel values to `out`.
    fn push_channels(
        &self,
        out: &mut Vec<f64>,
        material: Color,
        light: Color,
        intensity: f64,
        rendered: u32,
    ) {
        match self.material {
            MaterialColorMode::Rgba => out.extend(material.rgba()),
            MaterialColorMode::GreyScale => out.push(luma(material.rgb())),
            MaterialColorMode::Rgb => out.extend(material.rgb()),
        }

        match self.light {
            LightColorMode::Rgbai => {
                out.extend(light.rgba());
                out.push(intensity);
            }
            LightColorMode::Rgba => out.extend(light.rgba()),
            LightColorMode::Rgbi => {
                out.extend(light.rgb());
                out.push(intensity);
            }
            LightColorMode::Rgb => out.extend(light.rgb()),
            LightColorMode::GreyScale => out.push(luma(light.rgb())),
            LightColorMode::Intensity => out.push(intensity),
        }

        out.push(f64::from(rendered));
    }
}

/// A value shared by every point of an actor, or one value per point.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute<T> {
    Broadcast(T),
    PerPoint(Vec<T>),
}

impl<T: Copy> Attribute<T> {
    fn at(&self, index: usize) -> T {
        match self {
            Self::Broadcast(value) => *value,
            Self::PerPoint(values) => values[index],
        }
    }

    fn check_len(
        &self,
        actor: &str,
        attribute: &'static str,
        expected: usize,
    ) -> Result<(), ConvertError> {
        match self {
            Self::PerPoint(values) if values.len() != expected => {
                Err(ConvertError::AttributeLengthMismatch {
                    actor: actor.to_string(),
                    attribute,
                    found: values.len(),
                    expected,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Appearance of one actor resolved for composition.
#[derive(Debug, Clone, PartialEq)]
pub struct PointAttributes {
    pub material: Attribute<Color>,
    pub light: Attribute<Color>,
    pub intensity: Attribute<f64>,
    pub rendered: u32,
}

impl PointAttributes {
    /// Broadcast an actor's parsed appearance.
    /// Missing colours are black and opaque, a missing intensity is 0 and a
    /// missing rendered flag counts as rendered.
    pub fn from_appearance(appearance: &Appearance) -> Self {
        Self {
            material: Attribute::Broadcast(appearance.material_color.unwrap_or_default()),
            light: Attribute::Broadcast(appearance.light_color.unwrap_or_default()),
            intensity: Attribute::Broadcast(appearance.light_intensity.unwrap_or(0.0)),
            rendered: appearance.rendered_weight.unwrap_or(1),
        }
    }
}

/// Composed records sharing one channel layout.
/// Channel values stay unquantized until serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct PointBuffer {
    layout: ChannelLayout,
    positions: Vec<DVec3>,
    attributes: Vec<f64>,
}

impl PointBuffer {
    pub fn new(layout: ChannelLayout) -> Self {
        Self {
            layout,
            positions: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [DVec3] {
        &mut self.positions
    }

    /// Channel values of record `index`.
    pub fn channels(&self, index: usize) -> &[f64] {
        let width = self.layout.attribute_count();
        &self.attributes[index * width..(index + 1) * width]
    }

    pub fn records(&self) -> impl Iterator<Item = (DVec3, &[f64])> {
        self.positions
            .iter()
            .copied()
            .zip(self.attributes.chunks_exact(self.layout.attribute_count()))
    }

    /// Append records from another buffer with the same layout.
    pub fn append(&mut self, other: PointBuffer) {
        debug_assert_eq!(self.layout, other.layout);
        self.positions.extend(other.positions);
        self.attributes.extend(other.attributes);
    }

    /// Append one record per point, merging the actor's attributes.
    pub fn compose(
        &mut self,
        actor: &str,
        points: &[DVec3],
        attributes: &PointAttributes,
    ) -> Result<(), ConvertError> {
        attributes
            .material
            .check_len(actor, "material color", points.len())?;
        attributes
            .light
            .check_len(actor, "light color", points.len())?;
        attributes
            .intensity
            .check_len(actor, "light intensity", points.len())?;

        self.positions.reserve(points.len());
        self.attributes
            .reserve(points.len() * self.layout.attribute_count());

        for (index, point) in points.iter().enumerate() {
            self.positions.push(*point);
            self.layout.push_channels(
                &mut self.attributes,
                attributes.material.at(index),
                attributes.light.at(index),
                attributes.intensity.at(index),
                attributes.rendered,
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn attributes() -> PointAttributes {
        PointAttributes {
            material: Attribute::Broadcast(Color([200.0, 100.0, 50.0, 255.0])),
            light: Attribute::Broadcast(Color([10.0, 20.0, 30.0, 40.0])),
            intensity: Attribute::Broadcast(7.0),
            rendered: 3,
        }
    }

    #[test]
    fn rgb_rgb_layout_has_seven_channels() {
        let layout = ChannelLayout::new(MaterialColorMode::Rgb, LightColorMode::Rgb);
        assert_eq!(layout.attribute_count(), 7);
        assert_eq!(
            layout.property_names(),
            vec![
                "red",
                "green",
                "blue",
                "light_red",
                "light_green",
                "light_blue",
                "rendered"
            ]
        );
    }

    #[test]
    fn property_names_match_attribute_count() {
        let materials = [
            MaterialColorMode::Rgba,
            MaterialColorMode::GreyScale,
            MaterialColorMode::Rgb,
        ];
        let lights = [
            LightColorMode::Rgbai,
            LightColorMode::Rgba,
            LightColorMode::Rgbi,
            LightColorMode::Rgb,
            LightColorMode::GreyScale,
            LightColorMode::Intensity,
        ];
        for material in materials {
            for light in lights {
                let layout = ChannelLayout::new(material, light);
                assert_eq!(layout.property_names().len(), layout.attribute_count());
                assert_eq!(layout.property_names().last(), Some(&"rendered"));
            }
        }
    }

    #[test]
    fn grey_scale_uses_luma() {
        let layout = ChannelLayout::new(MaterialColorMode::GreyScale, LightColorMode::Intensity);
        let mut buffer = PointBuffer::new(layout);
        buffer
            .compose("A", &[DVec3::ZERO], &attributes())
            .unwrap();

        let channels = buffer.channels(0);
        assert_eq!(channels.len(), 3);
        assert_abs_diff_eq!(
            channels[0],
            0.299 * 200.0 + 0.587 * 100.0 + 0.114 * 50.0,
            epsilon = 1e-9
        );
        assert_eq!(channels[1], 7.0);
        assert_eq!(channels[2], 3.0);
    }

    #[test]
    fn intensity_trails_light_colour() {
        let layout = ChannelLayout::new(MaterialColorMode::Rgba, LightColorMode::Rgbai);
        let mut buffer = PointBuffer::new(layout);
        buffer
            .compose("A", &[DVec3::ONE, DVec3::ZERO], &attributes())
            .unwrap();

        assert_eq!(buffer.len(), 2);
        assert_eq!(
            buffer.channels(1),
            &[200.0, 100.0, 50.0, 255.0, 10.0, 20.0, 30.0, 40.0, 7.0, 3.0]
        );

        let rgbi = ChannelLayout::new(MaterialColorMode::Rgb, LightColorMode::Rgbi);
        let mut buffer = PointBuffer::new(rgbi);
        buffer.compose("A", &[DVec3::ONE], &attributes()).unwrap();
        assert_eq!(
            buffer.channels(0),
            &[200.0, 100.0, 50.0, 10.0, 20.0, 30.0, 7.0, 3.0]
        );
    }

    #[test]
    fn per_point_colours_are_applied_in_order() {
        let layout = ChannelLayout::new(MaterialColorMode::Rgb, LightColorMode::Intensity);
        let mut attrs = attributes();
        attrs.material = Attribute::PerPoint(vec![
            Color([1.0, 2.0, 3.0, 4.0]),
            Color([5.0, 6.0, 7.0, 8.0]),
        ]);

        let mut buffer = PointBuffer::new(layout);
        buffer
            .compose("Cloud", &[DVec3::X, DVec3::Y], &attrs)
            .unwrap();
        assert_eq!(buffer.channels(0), &[1.0, 2.0, 3.0, 7.0, 3.0]);
        assert_eq!(buffer.channels(1), &[5.0, 6.0, 7.0, 7.0, 3.0]);
    }

    #[test]
    fn per_point_length_mismatch_is_an_error() {
        let layout = ChannelLayout::new(MaterialColorMode::Rgb, LightColorMode::Rgb);
        let mut attrs = attributes();
        attrs.light = Attribute::PerPoint(vec![Color::default()]);

        let mut buffer = PointBuffer::new(layout);
        let err = buffer
            .compose("Cloud", &[DVec3::X, DVec3::Y], &attrs)
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::AttributeLengthMismatch {
                found: 1,
                expected: 2,
                ..
            }
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn missing_appearance_uses_defaults() {
        let attrs = PointAttributes::from_appearance(&Appearance::default());
        assert_eq!(attrs.rendered, 1);
        assert_eq!(attrs.intensity, Attribute::Broadcast(0.0));
        assert_eq!(attrs.material, Attribute::Broadcast(Color([0.0, 0.0, 0.0, 255.0])));
    }
}
