use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub title_font_size: f32,
    pub card_fill: String,
    pub card_border: String,
    pub card_radius: f32,
    pub name_color: String,
    pub title_color: String,
    pub line_color: String,
    pub selected_border: String,
    pub toggle_fill: String,
    pub toggle_border: String,
    pub toggle_text: String,
    pub avatar_fill: String,
    pub avatar_text: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 16.0,
            title_font_size: 13.0,
            card_fill: "#FFFFFF".to_string(),
            card_border: "#9AA5B1".to_string(),
            card_radius: 6.0,
            name_color: "#1F2933".to_string(),
            title_color: "#52606D".to_string(),
            line_color: "#616E7C".to_string(),
            selected_border: "#2F80ED".to_string(),
            toggle_fill: "#FFFFFF".to_string(),
            toggle_border: "#616E7C".to_string(),
            toggle_text: "#1F2933".to_string(),
            avatar_fill: "#E4E7EB".to_string(),
            avatar_text: "#3E4C59".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            title_font_size: 12.0,
            card_fill: "#F8FAFF".to_string(),
            card_border: "#C7D2E5".to_string(),
            card_radius: 12.0,
            name_color: "#1C2430".to_string(),
            title_color: "#5B6B84".to_string(),
            line_color: "#7A8AA6".to_string(),
            selected_border: "#3B82F6".to_string(),
            toggle_fill: "#EEF2F8".to_string(),
            toggle_border: "#7A8AA6".to_string(),
            toggle_text: "#1C2430".to_string(),
            avatar_fill: "#DCE4F2".to_string(),
            avatar_text: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "classic" | "default" | "base" => Some(Self::classic()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
