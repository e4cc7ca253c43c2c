use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;

use crate::drivers::error::GsrError;

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub trace: RGBColor,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 400,
            background: RGBColor(10, 10, 10),
            trace: CYAN,
        }
    }
}

/// Renders conductance over (normalized) time as a PNG.
pub fn render_conductance_png(
    time: &[f64],
    conductance: &[f64],
    style: &PlotStyle,
) -> Result<Vec<u8>, GsrError> {
    if time.is_empty() || time.len() != conductance.len() {
        return Err(GsrError::Plot(format!(
            "need matching, non-empty series (time={}, conductance={})",
            time.len(),
            conductance.len()
        )));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let (t_min, t_max) = bounds(time);
        let (c_min, c_max) = bounds(conductance);
        let x_range = if t_max - t_min < f64::EPSILON {
            t_min..t_min + 1.0
        } else {
            t_min..t_max
        };
        let y_range = if c_max - c_min < f64::EPSILON {
            (c_min - 1.0)..(c_max + 1.0)
        } else {
            let margin = (c_max - c_min) * 0.05;
            (c_min - margin)..(c_max + margin)
        };
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                "Skin conductance",
                ("sans-serif", 20).into_font().color(&WHITE),
            )
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x_range, y_range)?;
        chart
            .configure_mesh()
            .x_desc("Time (s)")
            .y_desc("Conductance (uS)")
            .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        let series = time.iter().copied().zip(conductance.iter().copied());
        chart.draw_series(LineSeries::new(series, &style.trace))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, GsrError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| GsrError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
