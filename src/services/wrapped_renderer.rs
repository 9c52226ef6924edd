use crate::error::{Result, WrappedError};
use crate::models::display::DisplayModel;
use image::{ImageBuffer, ImageEncoder, RgbaImage};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use usvg::{TreeParsing, TreeTextToPath};

const CANVAS_WIDTH: usize = 800;
const PADDING: usize = 40;
const CONTENT_WIDTH: usize = CANVAS_WIDTH - 2 * PADDING;
const CARD_GAP: usize = 20;
const CARD_HEIGHT: usize = 112;
const LANGUAGE_ROW_HEIGHT: usize = 30;
const REPOSITORY_ROW_HEIGHT: usize = 28;
const STARRED_ROW_HEIGHT: usize = 26;
const STARRED_STARS_WIDTH: usize = 90;
const LANGUAGE_NAME_WIDTH: usize = 160;
const LANGUAGE_BAR_WIDTH: usize = 460;
const CHART_HEIGHT: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    GitHubGreen,
    GitHubBlue,
    Halloween,
    Winter,
    Ocean,
    Sunset,
    Forest,
    Monochrome,
    Rainbow,
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github_green" => Ok(ColorScheme::GitHubGreen),
            "github_blue" => Ok(ColorScheme::GitHubBlue),
            "halloween" => Ok(ColorScheme::Halloween),
            "winter" => Ok(ColorScheme::Winter),
            "ocean" => Ok(ColorScheme::Ocean),
            "sunset" => Ok(ColorScheme::Sunset),
            "forest" => Ok(ColorScheme::Forest),
            "monochrome" => Ok(ColorScheme::Monochrome),
            "rainbow" => Ok(ColorScheme::Rainbow),
            other => Err(format!(
                "Unknown color scheme '{}'. Supported: github_green, github_blue, halloween, winter, ocean, sunset, forest, monochrome, rainbow",
                other
            )),
        }
    }
}

// Color palette definitions for different schemes
pub struct ColorPalette {
    pub colors: Vec<String>, // 5 colors from low to high intensity
}

impl ColorPalette {
    pub fn from_scheme(scheme: ColorScheme) -> Self {
        let colors: [&str; 5] = match scheme {
            ColorScheme::GitHubGreen => ["#ebedf0", "#9be9a8", "#40c463", "#30a14e", "#216e39"],
            ColorScheme::GitHubBlue => ["#ebedf0", "#9be9ff", "#40c4ff", "#2196f3", "#1565c0"],
            ColorScheme::Halloween => ["#ebedf0", "#ffee4a", "#ffc501", "#fe9600", "#03001c"],
            ColorScheme::Winter => ["#ebedf0", "#b6e3f4", "#66c2e0", "#2e8ab8", "#1a5490"],
            ColorScheme::Ocean => ["#ebedf0", "#aadaff", "#5fb3f0", "#2b7bd1", "#0a4a94"],
            ColorScheme::Sunset => ["#ebedf0", "#ffd89b", "#ff9a56", "#ff6b35", "#d94400"],
            ColorScheme::Forest => ["#ebedf0", "#c8e6c9", "#81c784", "#43a047", "#2e7d32"],
            ColorScheme::Monochrome => ["#ebedf0", "#b0b0b0", "#808080", "#505050", "#202020"],
            ColorScheme::Rainbow => ["#ebedf0", "#ffeb3b", "#4caf50", "#2196f3", "#9c27b0"],
        };
        Self {
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn get_color_for_count(&self, count: u32, max_count: u32) -> &str {
        if count == 0 {
            return &self.colors[0];
        }

        if max_count == 0 {
            return &self.colors[1];
        }

        let ratio = count as f32 / max_count as f32;
        let index = match ratio {
            r if r >= 0.75 => 4,
            r if r >= 0.50 => 3,
            r if r >= 0.25 => 2,
            _ => 1,
        };

        &self.colors[index]
    }

    /// Colors for ranked rows, strongest first
    pub fn series_color(&self, index: usize) -> &str {
        &self.colors[4 - (index % 4)]
    }
}

#[derive(Debug, Clone)]
pub struct RenderTheme {
    pub color_scheme: ColorScheme,
    pub font_family: String,
    pub background_color: String,
    pub card_color: String,
    pub text_color: String,
    pub muted_color: String,
    /// Rasterization scale; 2.0 doubles the pixel dimensions
    pub scale: f32,
}

impl Default for RenderTheme {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::GitHubGreen,
            font_family: "DejaVu Sans".to_string(),
            background_color: "#0d1117".to_string(),
            card_color: "#161b22".to_string(),
            text_color: "#e6edf3".to_string(),
            muted_color: "#8b949e".to_string(),
            scale: 2.0,
        }
    }
}

impl RenderTheme {
    pub fn with_scheme(mut self, scheme: ColorScheme) -> Self {
        self.color_scheme = scheme;
        self
    }

    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }
}

/// Render the card and write it as a PNG at `output_path`, replacing any existing file
pub fn render(display: &DisplayModel, output_path: &Path, theme: &RenderTheme) -> Result<()> {
    let start_time = std::time::Instant::now();

    let svg = generate_svg(display, theme);
    let png = svg_to_png(&svg, theme.scale)?;
    write_atomically(output_path, &png)?;

    log::debug!(
        "Rendered wrapped card: {} ({} bytes) in {:?}",
        output_path.display(),
        png.len(),
        start_time.elapsed()
    );

    Ok(())
}

/// Lay out the card as an SVG document
pub fn generate_svg(display: &DisplayModel, theme: &RenderTheme) -> String {
    let palette = ColorPalette::from_scheme(theme.color_scheme);
    let accent = palette.colors[3].clone();
    let font = format!(
        "{}, sans-serif",
        html_escape::encode_double_quoted_attribute(&theme.font_family)
    );
    let mut body = String::new();
    let mut y = PADDING;

    // Header: title on the left, handle on the right
    y += 34;
    text(&mut body, &font, PADDING, y, 32, &accent, "start", true, &display.title);
    text(
        &mut body,
        &font,
        CANVAS_WIDTH - PADDING,
        y,
        18,
        &theme.muted_color,
        "end",
        false,
        &format!("@{}", display.username),
    );
    y += 32;
    text(&mut body, &font, PADDING, y, 16, &theme.text_color, "start", false, &display.greeting);
    y += 24;

    // Headline cards
    let card_count = display.headlines.len().max(1);
    let card_width = (CONTENT_WIDTH - CARD_GAP * (card_count - 1)) / card_count;
    for (i, headline) in display.headlines.iter().enumerate() {
        let x = PADDING + i * (card_width + CARD_GAP);
        let _ = write!(
            body,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="10" fill="{}"/>"#,
            x, y, card_width, CARD_HEIGHT, theme.card_color
        );
        text(&mut body, &font, x + 18, y + 48, 34, &theme.text_color, "start", true, &headline.value);
        text(&mut body, &font, x + 18, y + 74, 15, &accent, "start", false, &headline.label);
        text(&mut body, &font, x + 18, y + 96, 12, &theme.muted_color, "start", false, &headline.flavor);
    }
    y += CARD_HEIGHT;

    if let Some(stars) = &display.stars_line {
        y += 28;
        text(&mut body, &font, PADDING, y, 14, &theme.muted_color, "start", false, stars);
    }

    // Languages
    y += 48;
    text(&mut body, &font, PADDING, y, 20, &theme.text_color, "start", true, "Top languages");
    y += 12;
    if display.languages.is_empty() {
        y += 24;
        text(&mut body, &font, PADDING, y, 14, &theme.muted_color, "start", false, "No language data this year");
    }
    for (i, language) in display.languages.iter().enumerate() {
        let row_top = y + i * LANGUAGE_ROW_HEIGHT;
        let baseline = row_top + 20;
        text(&mut body, &font, PADDING, baseline, 15, &theme.text_color, "start", false, &language.name);

        let bar_x = PADDING + LANGUAGE_NAME_WIDTH;
        let _ = write!(
            body,
            r#"<rect x="{}" y="{}" width="{}" height="14" rx="4" fill="{}"/>"#,
            bar_x,
            row_top + 8,
            LANGUAGE_BAR_WIDTH,
            theme.card_color
        );
        let filled = bar_length(language.share, LANGUAGE_BAR_WIDTH);
        if filled > 0 {
            let _ = write!(
                body,
                r#"<rect x="{}" y="{}" width="{}" height="14" rx="4" fill="{}"/>"#,
                bar_x,
                row_top + 8,
                filled,
                palette.series_color(i)
            );
        }
        text(
            &mut body,
            &font,
            CANVAS_WIDTH - PADDING,
            baseline,
            14,
            &theme.muted_color,
            "end",
            false,
            &language.percent_label,
        );
    }
    y += display.languages.len() * LANGUAGE_ROW_HEIGHT;

    // Repositories
    y += 44;
    text(&mut body, &font, PADDING, y, 20, &theme.text_color, "start", true, "Top repositories");
    y += 8;
    if display.repositories.is_empty() {
        y += 24;
        text(&mut body, &font, PADDING, y, 14, &theme.muted_color, "start", false, "No repository activity this year");
    }
    for (i, repo) in display.repositories.iter().enumerate() {
        let baseline = y + (i + 1) * REPOSITORY_ROW_HEIGHT;
        text(
            &mut body,
            &font,
            PADDING,
            baseline,
            15,
            &theme.text_color,
            "start",
            false,
            &format!("{}. {}", i + 1, repo.name),
        );
        text(&mut body, &font, CANVAS_WIDTH - PADDING, baseline, 13, &theme.muted_color, "end", false, &repo.detail);
    }
    y += display.repositories.len() * REPOSITORY_ROW_HEIGHT;

    // Most starred, skipped entirely when nothing has stars
    if !display.starred.is_empty() {
        y += 44;
        text(&mut body, &font, PADDING, y, 20, &theme.text_color, "start", true, "Most starred");
        y += 8;
        for (i, repo) in display.starred.iter().enumerate() {
            let baseline = y + (i + 1) * STARRED_ROW_HEIGHT;
            text(&mut body, &font, PADDING, baseline, 14, &accent, "start", true, &repo.stars_label);
            text(
                &mut body,
                &font,
                PADDING + STARRED_STARS_WIDTH,
                baseline,
                15,
                &theme.text_color,
                "start",
                false,
                &repo.name,
            );
            text(&mut body, &font, CANVAS_WIDTH - PADDING, baseline, 12, &theme.muted_color, "end", false, &repo.detail);
        }
        y += display.starred.len() * STARRED_ROW_HEIGHT;
    }

    // Monthly timeline
    y += 44;
    text(&mut body, &font, PADDING, y, 20, &theme.text_color, "start", true, "Activity by month");
    y += 28;
    let chart_top = y;
    let slot = CONTENT_WIDTH / display.timeline.len().max(1);
    let bar_width = slot * 2 / 3;
    let max_count = display.timeline.iter().map(|bar| bar.count).max().unwrap_or(0);
    for (i, bar) in display.timeline.iter().enumerate() {
        let x = PADDING + i * slot + (slot - bar_width) / 2;
        let height = bar_length(bar.ratio, CHART_HEIGHT);
        let bar_top = chart_top + CHART_HEIGHT - height;
        if height > 0 {
            let _ = write!(
                body,
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="3" fill="{}"/>"#,
                x,
                bar_top,
                bar_width,
                height,
                palette.get_color_for_count(bar.count, max_count)
            );
            text(
                &mut body,
                &font,
                x + bar_width / 2,
                bar_top.saturating_sub(6),
                11,
                &theme.muted_color,
                "middle",
                false,
                &bar.count.to_string(),
            );
        }
        text(
            &mut body,
            &font,
            x + bar_width / 2,
            chart_top + CHART_HEIGHT + 18,
            12,
            &theme.muted_color,
            "middle",
            false,
            &bar.label,
        );
    }
    let _ = write!(
        body,
        r#"<rect x="{}" y="{}" width="{}" height="1" fill="{}"/>"#,
        PADDING,
        chart_top + CHART_HEIGHT,
        CONTENT_WIDTH,
        theme.muted_color
    );
    y = chart_top + CHART_HEIGHT + 18;

    if let Some(busiest) = &display.busiest_month {
        y += 30;
        text(&mut body, &font, PADDING, y, 14, &theme.text_color, "start", false, busiest);
    }

    // Footer
    y += 44;
    text(
        &mut body,
        &font,
        CANVAS_WIDTH / 2,
        y,
        14,
        &theme.muted_color,
        "middle",
        false,
        &display.footer,
    );
    let height = y + PADDING;

    let mut svg = String::with_capacity(body.len() + 256);
    let _ = write!(
        svg,
        r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
        w = CANVAS_WIDTH,
        h = height
    );
    let _ = write!(
        svg,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        theme.background_color
    );
    svg.push_str(&body);
    svg.push_str("</svg>");
    svg
}

#[allow(clippy::too_many_arguments)]
fn text(
    out: &mut String,
    font: &str,
    x: usize,
    y: usize,
    size: u32,
    fill: &str,
    anchor: &str,
    bold: bool,
    content: &str,
) {
    let weight = if bold { r#" font-weight="bold""# } else { "" };
    let _ = write!(
        out,
        r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" text-anchor="{}"{}>{}</text>"#,
        x,
        y,
        font,
        size,
        fill,
        anchor,
        weight,
        html_escape::encode_text(content)
    );
}

/// Pixel length for a 0..=1 ratio; any non-zero ratio stays visible
fn bar_length(ratio: f64, full: usize) -> usize {
    if ratio <= 0.0 {
        return 0;
    }
    ((ratio.min(1.0) * full as f64).round() as usize).max(2)
}

/// Rasterize SVG to PNG
pub fn svg_to_png(svg_content: &str, scale: f32) -> Result<Vec<u8>> {
    // Create font database and load system fonts
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();

    let opts = usvg::Options::default();

    let mut tree = usvg::Tree::from_data(svg_content.as_bytes(), &opts)
        .map_err(|e| WrappedError::Render(format!("Invalid SVG: {}", e)))?;

    // Convert text to paths using the font database
    tree.convert_text(&fontdb);

    let pixmap_size = tree.size.to_int_size();
    let scaled_width = (pixmap_size.width() as f32 * scale) as u32;
    let scaled_height = (pixmap_size.height() as f32 * scale) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(scaled_width, scaled_height).ok_or_else(|| {
        WrappedError::Render(format!(
            "Failed to create {}x{} pixmap",
            scaled_width, scaled_height
        ))
    })?;

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::Tree::from_usvg(&tree).render(transform, &mut pixmap.as_mut());

    let img: RgbaImage =
        ImageBuffer::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec())
            .ok_or_else(|| WrappedError::Render("Failed to create image buffer".to_string()))?;

    // Use PNG encoder with best compression (lossless)
    let mut buffer = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new_with_quality(
        &mut buffer,
        image::codecs::png::CompressionType::Best,
        image::codecs::png::FilterType::Adaptive,
    );
    encoder
        .write_image(img.as_raw(), img.width(), img.height(), image::ColorType::Rgba8)
        .map_err(|e| WrappedError::Render(format!("PNG encoding failed: {}", e)))?;

    Ok(buffer)
}

/// Write through a sibling temp file so a failed write never leaves a partial image
fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let io_error = |source: std::io::Error| WrappedError::RenderIo {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let temp_path = temp_path_for(path);
    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(e));
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(e));
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "wrapped.png".to_string());
    path.with_file_name(format!(".{}.partial", file_name))
}
