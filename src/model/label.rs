//! Label taxonomy: which labels exist, which layer they belong to, and how
//! they are colored.
//!
//! The default table mirrors the vessel groups used for angiography
//! annotation: vessel names are keypoint labels, bifurcation names toggle the
//! skeleton tool, and a small closed set of labels is used for regions.

use std::collections::HashMap;

use super::Tool;
use crate::color_utils::parse_color;
use crate::constants::annotation::{HIDE_REGION, OCCLUSION};

/// RGB color.
pub type Color = [u8; 3];

/// Color used for labels missing from the table.
pub const FALLBACK_COLOR: Color = [128, 128, 128];

/// Annotation layer a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelLayer {
    Keypoint,
    Skeleton,
    Region,
}

/// A named anatomical group of vessels and their bifurcations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGroup {
    pub name: String,
    pub vessels: Vec<String>,
    pub bifurcations: Vec<String>,
}

impl LabelGroup {
    pub fn new(name: &str, vessels: &[&str], bifurcations: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            vessels: vessels.iter().map(|s| s.to_string()).collect(),
            bifurcations: bifurcations.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LabelEntry {
    color: Color,
    layer: LabelLayer,
}

/// Static mapping from label name to color and layer.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    entries: HashMap<String, LabelEntry>,
    colors: HashMap<String, Color>,
    groups: Vec<LabelGroup>,
    region_labels: Vec<String>,
}

impl LabelTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a color for a label name, independent of its layer.
    pub fn set_color(&mut self, label: &str, color: Color) {
        self.colors.insert(label.to_string(), color);
        if let Some(entry) = self.entries.get_mut(label) {
            entry.color = color;
        }
    }

    fn insert(&mut self, label: &str, layer: LabelLayer) {
        let color = self.colors.get(label).copied().unwrap_or(FALLBACK_COLOR);
        self.entries
            .insert(label.to_string(), LabelEntry { color, layer });
    }

    /// Add a group; its vessels become keypoint labels and its bifurcations
    /// skeleton labels.
    pub fn add_group(&mut self, group: LabelGroup) {
        for vessel in &group.vessels {
            self.insert(vessel, LabelLayer::Keypoint);
        }
        for bifurcation in &group.bifurcations {
            self.insert(bifurcation, LabelLayer::Skeleton);
        }
        self.groups.push(group);
    }

    pub fn add_region_label(&mut self, label: &str) {
        self.insert(label, LabelLayer::Region);
        if !self.region_labels.iter().any(|l| l == label) {
            self.region_labels.push(label.to_string());
        }
    }

    /// Display color of a label, or [`FALLBACK_COLOR`] if unknown.
    pub fn color_of(&self, label: &str) -> Color {
        self.entries
            .get(label)
            .map(|e| e.color)
            .or_else(|| self.colors.get(label).copied())
            .unwrap_or(FALLBACK_COLOR)
    }

    pub fn layer_of(&self, label: &str) -> Option<LabelLayer> {
        self.entries.get(label).map(|e| e.layer)
    }

    /// The tool a label selection activates.
    pub fn tool_for(&self, label: &str) -> Option<Tool> {
        match self.layer_of(label)? {
            LabelLayer::Keypoint => Some(Tool::Keypoint(label.to_string())),
            LabelLayer::Skeleton => Some(Tool::Skeleton),
            LabelLayer::Region => Some(Tool::Region(label.to_string())),
        }
    }

    pub fn groups(&self) -> &[LabelGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&LabelGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn region_labels(&self) -> &[String] {
        &self.region_labels
    }

    /// The default vessel taxonomy.
    pub fn vessels() -> Self {
        let mut table = Self::new();
        for (label, spec) in DEFAULT_COLORS {
            match parse_color(spec) {
                Some(color) => table.set_color(label, color),
                None => log::warn!("Ignoring invalid color '{}' for label '{}'", spec, label),
            }
        }
        for group in default_groups() {
            table.add_group(group);
        }
        table.add_region_label(OCCLUSION);
        table.add_region_label(HIDE_REGION);
        table
    }
}

/// Default anatomical groups.
pub fn default_groups() -> Vec<LabelGroup> {
    vec![
        LabelGroup::new(
            "Cranial",
            &[
                "ICA", "MCA1", "MCA2", "MCA3", "ACA1", "ACA2", "ACA3", "PCA1", "PCA2", "PCA3",
                "BA", "VA", "PCOM", "SCA", "PCA",
            ],
            &[
                "Bifurcation carotidienne",
                "MCA1 -> MCA2",
                "MCA2 -> MCA3",
                "ACA1 -> ACA2",
                "ACA2 -> ACA3",
                "PCA1 -> PCA2",
                "PCA2 -> PCA3",
                "M1 -> M1",
                "M2 -> M2",
                "M3 -> M3",
            ],
        ),
        LabelGroup::new(
            "Abdominal",
            &[
                "Abdominal Aorta",
                "Celiac Trunk",
                "Left Gastric Artery",
                "Splenic Artery",
                "Common Hepatic Artery",
                "Gastroduodenal Artery",
                "Right Gastric Artery",
                "Left Hepatic Artery",
                "Right Hepatic Artery",
                "Superior Mesenteric Artery (SMA)",
                "Middle Colic Artery",
                "Right Colic Artery",
                "Ileocolic Artery",
                "Intestinal Branches",
                "Inferior Mesenteric Artery (IMA)",
                "Left Colic Artery",
                "Sigmoid Arteries",
                "Superior Rectal Artery",
                "Renal Arteries (Right and Left)",
                "Common Iliac Arteries (Right and Left)",
                "Internal Iliac Artery",
                "External Iliac Artery",
            ],
            &[
                "Abdominal Aorta → Celiac Trunk",
                "Abdominal Aorta → SMA",
                "Abdominal Aorta → IMA",
                "Celiac Trunk → Left Gastric Artery",
                "Celiac Trunk → Common Hepatic Artery",
                "Celiac Trunk → Splenic Artery",
                "Common Hepatic Artery → Gastroduodenal Artery",
                "Common Hepatic Artery → Right Gastric Artery",
                "Common Hepatic Artery → Right Hepatic Artery",
                "Common Hepatic Artery → Left Hepatic Artery",
                "SMA → Middle Colic Artery",
                "SMA → Right Colic Artery",
                "SMA → Ileocolic Artery",
                "SMA → Intestinal Branches",
                "IMA → Left Colic Artery",
                "IMA → Sigmoid Arteries",
                "IMA → Superior Rectal Artery",
            ],
        ),
        LabelGroup::new(
            "Coronary",
            &[
                "Right Coronary Artery (RCA)",
                "Conus Branch",
                "Sinoatrial (SA) Nodal Branch",
                "Right Marginal Artery",
                "Posterior Descending Artery (PDA)",
                "Left Main Coronary Artery (LMCA)",
                "Left Anterior Descending (LAD)",
                "Left Circumflex (LCx)",
                "Ramus Intermedius",
            ],
            &[
                "RCA → Conus Branch",
                "RCA → SA Nodal Branch",
                "RCA → Right Marginal Artery",
                "RCA → PDA",
                "LMCA → LAD",
                "LMCA → LCx",
                "LMCA → Ramus Intermedius",
            ],
        ),
        LabelGroup::new(
            "UpperLimb",
            &[
                "Subclavian Artery",
                "Axillary Artery",
                "Brachial Artery",
                "Radial Artery",
                "Ulnar Artery",
                "Palmar Arche",
                "Superficial Palmar Arch",
                "Deep Palmar Arch",
            ],
            &[
                "Subclavian Artery → Axillary Artery",
                "Axillary Artery → Brachial Artery",
                "Brachial Artery → Radial Artery",
                "Brachial Artery → Ulnar Artery",
                "Ulnar Artery → Superficial Palmar Arch",
                "Radial Artery → Deep Palmar Arch",
            ],
        ),
        LabelGroup::new(
            "LowerLimb",
            &[
                "Common Iliac Artery",
                "External Iliac Artery",
                "Internal Iliac Artery",
                "Femoral Artery",
                "Deep Femoral Artery",
                "Superficial Femoral Artery",
                "Popliteal Artery",
                "Anterior Tibial Artery",
                "Posterior Tibial Artery",
                "Fibular (Peroneal) Artery",
                "Medial Plantar Artery",
                "Lateral Plantar Artery",
                "Dorsalis Pedis Artery",
                "Arcuate Artery",
                "Deep Plantar Branch",
            ],
            &[
                "Common Iliac Artery → External Iliac Artery",
                "Common Iliac Artery → Internal Iliac Artery",
                "External Iliac Artery → Femoral Artery",
                "Femoral Artery → Deep Femoral Artery",
                "Femoral Artery → Superficial Femoral Artery",
                "Popliteal Artery → Anterior Tibial Artery",
                "Popliteal Artery → Posterior Tibial Artery",
                "Posterior Tibial Artery → Fibular Artery",
            ],
        ),
    ]
}

/// Label colors; later entries override earlier ones.
const DEFAULT_COLORS: &[(&str, &str)] = &[
    // Cranial
    ("ICA", "#F8BBD0"),
    ("MCA1", "#BBDEFB"),
    ("MCA2", "#B2EBF2"),
    ("MCA3", "#FFECB3"),
    ("ACA1", "#DCEDC8"),
    ("ACA2", "#C8E6C9"),
    ("ACA3", "#AED581"),
    ("PCA1", "#E1BEE7"),
    ("PCA2", "#D1C4E9"),
    ("PCA3", "#CE93D8"),
    ("BA", "#B3E5FC"),
    ("VA", "#FFE0B2"),
    ("SCA", "#B2DFDB"),
    ("PCOM", "#FFF9C4"),
    ("PCA", "#E0F7FA"),
    ("Bifurcation carotidienne", "#F48FB1"),
    ("MCA1 -> MCA2", "#90CAF9"),
    ("MCA2 -> MCA3", "#80DEEA"),
    ("ACA1 -> ACA2", "#A5D6A7"),
    ("ACA2 -> ACA3", "#81C784"),
    ("PCA1 -> PCA2", "#CE93D8"),
    ("PCA2 -> PCA3", "#BA68C8"),
    // Abdominal
    ("Abdominal Aorta", "#E57373"),
    ("Celiac Trunk", "#F06292"),
    ("Left Gastric Artery", "#BA68C8"),
    ("Splenic Artery", "#9575CD"),
    ("Common Hepatic Artery", "#7986CB"),
    ("Gastroduodenal Artery", "#64B5F6"),
    ("Right Gastric Artery", "#4FC3F7"),
    ("Left Hepatic Artery", "#4DB6AC"),
    ("Right Hepatic Artery", "#81C784"),
    ("Superior Mesenteric Artery (SMA)", "#AED581"),
    ("Middle Colic Artery", "#DCE775"),
    ("Right Colic Artery", "#FFF176"),
    ("Ileocolic Artery", "#FFD54F"),
    ("Intestinal Branches", "#FFB74D"),
    ("Inferior Mesenteric Artery (IMA)", "#A1887F"),
    ("Left Colic Artery", "#90A4AE"),
    ("Sigmoid Arteries", "#B0BEC5"),
    ("Superior Rectal Artery", "#F8BBD0"),
    ("Renal Arteries (Right and Left)", "#CE93D8"),
    ("Common Iliac Arteries (Right and Left)", "#B39DDB"),
    ("Internal Iliac Artery", "#9FA8DA"),
    ("External Iliac Artery", "#90CAF9"),
    // Coronary
    ("Right Coronary Artery (RCA)", "#FFAB91"),
    ("Conus Branch", "#FFCC80"),
    ("Sinoatrial (SA) Nodal Branch", "#FFE082"),
    ("Right Marginal Artery", "#FFF59D"),
    ("Posterior Descending Artery (PDA)", "#E6EE9C"),
    ("Left Main Coronary Artery (LMCA)", "#C5E1A5"),
    ("Left Anterior Descending (LAD)", "#B2DFDB"),
    ("Left Circumflex (LCx)", "#B3E5FC"),
    ("Ramus Intermedius", "#B2EBF2"),
    // Upper limb
    ("Subclavian Artery", "#B3E5FC"),
    ("Axillary Artery", "#81D4FA"),
    ("Brachial Artery", "#4FC3F7"),
    ("Radial Artery", "#29B6F6"),
    ("Ulnar Artery", "#03A9F4"),
    ("Palmar Arche", "#039BE5"),
    ("Superficial Palmar Arch", "#0288D1"),
    ("Deep Palmar Arch", "#0277BD"),
    // Lower limb
    ("Common Iliac Artery", "#26A69A"),
    ("External Iliac Artery", "#66BB6A"),
    ("Internal Iliac Artery", "#9CCC65"),
    ("Femoral Artery", "#D4E157"),
    ("Deep Femoral Artery", "#FFEE58"),
    ("Superficial Femoral Artery", "#FFCA28"),
    ("Popliteal Artery", "#FFA726"),
    ("Anterior Tibial Artery", "#FF7043"),
    ("Posterior Tibial Artery", "#8D6E63"),
    ("Fibular (Peroneal) Artery", "#BDBDBD"),
    ("Medial Plantar Artery", "#78909C"),
    ("Lateral Plantar Artery", "#A1887F"),
    ("Dorsalis Pedis Artery", "#E0E0E0"),
    ("Arcuate Artery", "#F48FB1"),
    ("Deep Plantar Branch", "#CE93D8"),
    // Bifurcations
    ("Abdominal Aorta → Celiac Trunk", "hsl(136, 70%, 80%)"),
    ("Abdominal Aorta → SMA", "hsl(226, 70%, 80%)"),
    ("Abdominal Aorta → IMA", "hsl(353, 70%, 80%)"),
    ("Celiac Trunk → Left Gastric Artery", "hsl(58, 70%, 80%)"),
    ("Celiac Trunk → Common Hepatic Artery", "hsl(132, 70%, 80%)"),
    ("Celiac Trunk → Splenic Artery", "hsl(116, 70%, 80%)"),
    ("Common Hepatic Artery → Gastroduodenal Artery", "hsl(95, 70%, 80%)"),
    ("Common Hepatic Artery → Right Gastric Artery", "hsl(210, 70%, 80%)"),
    ("Common Hepatic Artery → Right Hepatic Artery", "hsl(111, 70%, 80%)"),
    ("Common Hepatic Artery → Left Hepatic Artery", "hsl(40, 70%, 80%)"),
    ("SMA → Middle Colic Artery", "hsl(192, 70%, 80%)"),
    ("SMA → Right Colic Artery", "hsl(252, 70%, 80%)"),
    ("SMA → Ileocolic Artery", "hsl(271, 70%, 80%)"),
    ("SMA → Intestinal Branches", "hsl(72, 70%, 80%)"),
    ("IMA → Left Colic Artery", "hsl(52, 70%, 80%)"),
    ("IMA → Sigmoid Arteries", "hsl(120, 70%, 80%)"),
    ("IMA → Superior Rectal Artery", "hsl(100, 70%, 80%)"),
    ("RCA → Conus Branch", "hsl(42, 70%, 80%)"),
    ("RCA → SA Nodal Branch", "hsl(115, 70%, 80%)"),
    ("RCA → Right Marginal Artery", "hsl(167, 70%, 80%)"),
    ("RCA → PDA", "hsl(68, 70%, 80%)"),
    ("LMCA → LAD", "hsl(281, 70%, 80%)"),
    ("LMCA → LCx", "hsl(129, 70%, 80%)"),
    ("LMCA → Ramus Intermedius", "hsl(236, 70%, 80%)"),
    ("Subclavian Artery → Axillary Artery", "hsl(25, 70%, 80%)"),
    ("Axillary Artery → Brachial Artery", "hsl(299, 70%, 80%)"),
    ("Brachial Artery → Radial Artery", "hsl(210, 70%, 80%)"),
    ("Brachial Artery → Ulnar Artery", "hsl(347, 70%, 80%)"),
    ("Ulnar Artery → Superficial Palmar Arch", "hsl(203, 70%, 80%)"),
    ("Radial Artery → Deep Palmar Arch", "hsl(29, 70%, 80%)"),
    ("Common Iliac Artery → External Iliac Artery", "hsl(26, 70%, 80%)"),
    ("Common Iliac Artery → Internal Iliac Artery", "hsl(245, 70%, 80%)"),
    ("External Iliac Artery → Femoral Artery", "hsl(46, 70%, 80%)"),
    ("Femoral Artery → Deep Femoral Artery", "hsl(125, 70%, 80%)"),
    ("Femoral Artery → Superficial Femoral Artery", "hsl(161, 70%, 80%)"),
    ("Popliteal Artery → Anterior Tibial Artery", "hsl(356, 70%, 80%)"),
    ("Popliteal Artery → Posterior Tibial Artery", "hsl(167, 70%, 80%)"),
    ("Posterior Tibial Artery → Fibular Artery", "hsl(25, 70%, 80%)"),
    // Regions
    ("Occlusion", "#FF0000"),
    ("Hide Region", "#000000"),
];
