//! In-memory scene implementation.

use super::{Background, SceneAdapter, SceneError, SceneEvent, SceneResult};
use crate::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serialization format version written into every snapshot.
const SCENE_FORMAT_VERSION: &str = "1";

/// Color used for the background when rasterizing.
const BACKGROUND_RGBA: [u8; 4] = [255, 255, 255, 255];

/// Color used for object boxes when rasterizing.
const OBJECT_RGBA: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Serialize, Deserialize)]
struct SceneJson {
    version: String,
    objects: Vec<Value>,
}

/// In-memory drawing surface for testing and headless use.
///
/// Objects are plain JSON records. Records carrying numeric `left`, `top`,
/// `width` and `height` are rasterized as filled boxes.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    width: u32,
    height: u32,
    objects: Vec<Value>,
    zoom: f64,
    background: Option<Background>,
    events: Vec<SceneEvent>,
    render_requests: usize,
}

impl MemoryScene {
    /// Create an empty surface of the given pixel size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            objects: Vec::new(),
            zoom: 1.0,
            background: None,
            events: Vec::new(),
            render_requests: 0,
        }
    }

    /// Attach a background the way the page viewer does after loading a page.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    /// Add an object as if the user drew it.
    pub fn add_object(&mut self, object: Value) {
        self.objects.push(object);
        self.events.push(SceneEvent::ObjectAdded);
    }

    /// Replace an object as if the user transformed it.
    /// Returns false when `index` is out of range.
    pub fn modify_object(&mut self, index: usize, object: Value) -> bool {
        match self.objects.get_mut(index) {
            Some(slot) => {
                *slot = object;
                self.events.push(SceneEvent::ObjectModified);
                true
            }
            None => false,
        }
    }

    /// Remove an object as if the user deleted it.
    pub fn remove_object(&mut self, index: usize) -> Option<Value> {
        if index >= self.objects.len() {
            return None;
        }
        let removed = self.objects.remove(index);
        self.events.push(SceneEvent::ObjectRemoved);
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Number of renders requested so far.
    pub fn render_requests(&self) -> usize {
        self.render_requests
    }

    fn rasterize(&self) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut rgba = vec![0u8; w * h * 4];

        if self.background.is_some() {
            for pixel in rgba.chunks_exact_mut(4) {
                pixel.copy_from_slice(&BACKGROUND_RGBA);
            }
        }

        for object in &self.objects {
            let Some((left, top, width, height)) = object_box(object) else {
                continue;
            };
            let x0 = left.max(0.0) as usize;
            let y0 = top.max(0.0) as usize;
            let x1 = ((left + width).max(0.0) as usize).min(w);
            let y1 = ((top + height).max(0.0) as usize).min(h);
            for y in y0..y1 {
                for x in x0..x1 {
                    let i = (y * w + x) * 4;
                    rgba[i..i + 4].copy_from_slice(&OBJECT_RGBA);
                }
            }
        }

        rgba
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new(612, 792)
    }
}

fn object_box(object: &Value) -> Option<(f64, f64, f64, f64)> {
    Some((
        object.get("left")?.as_f64()?,
        object.get("top")?.as_f64()?,
        object.get("width")?.as_f64()?,
        object.get("height")?.as_f64()?,
    ))
}

/// Encode RGBA pixels as PNG.
fn encode_png(rgba: &[u8], width: u32, height: u32) -> SceneResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| SceneError::Render(format!("Failed to write PNG header: {}", e)))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| SceneError::Render(format!("Failed to write PNG data: {}", e)))?;
    }
    Ok(png_data)
}

impl SceneAdapter for MemoryScene {
    fn to_json(&self) -> SceneResult<String> {
        let json = SceneJson {
            version: SCENE_FORMAT_VERSION.to_string(),
            objects: self.objects.clone(),
        };
        Ok(serde_json::to_string(&json)?)
    }

    fn load_from_json<'a>(&'a mut self, json: &'a str) -> BoxFuture<'a, SceneResult<()>> {
        Box::pin(async move {
            let parsed: SceneJson = serde_json::from_str(json)?;

            // Rehydration goes through the same removal/addition path the
            // drawing engine uses, so it queues events like a user edit would.
            let removed = self.objects.len();
            self.objects.clear();
            self.events
                .extend(std::iter::repeat_n(SceneEvent::ObjectRemoved, removed));
            for object in parsed.objects {
                self.objects.push(object);
                self.events.push(SceneEvent::ObjectAdded);
            }
            Ok(())
        })
    }

    fn objects(&self) -> SceneResult<Vec<Value>> {
        Ok(self.objects.clone())
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    fn take_background(&mut self) -> Option<Background> {
        self.background.take()
    }

    fn set_background(&mut self, background: Option<Background>) {
        self.background = background;
    }

    fn request_render(&mut self) {
        self.render_requests += 1;
    }

    fn render_png(&mut self) -> SceneResult<Vec<u8>> {
        let rgba = self.rasterize();
        encode_png(&rgba, self.width, self.height)
    }

    fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}
