use reqwest::Url;
use serde::Serialize;

const SEARCH_URL: &str = "https://www.google.com/search";

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuickLink {
    pub name: &'static str,
    pub url: &'static str,
}

pub const QUICK_LINKS: [QuickLink; 5] = [
    QuickLink { name: "GitHub", url: "https://github.com" },
    QuickLink { name: "Notion", url: "https://notion.so" },
    QuickLink { name: "Gmail", url: "https://mail.google.com" },
    QuickLink { name: "ChatGPT", url: "https://chat.openai.com" },
    QuickLink { name: "YouTube", url: "https://youtube.com" },
];

pub fn find_quick_link(name: &str) -> Option<QuickLink> {
    let name = name.trim();
    QUICK_LINKS
        .iter()
        .copied()
        .find(|link| link.name.eq_ignore_ascii_case(name))
}

pub fn search_url(query: &str) -> Result<Url, String> {
    let query = query.trim();
    if query.is_empty() {
        return Err("Search query is empty".to_string());
    }
    Url::parse_with_params(SEARCH_URL, &[("q", query)]).map_err(|e| e.to_string())
}

async fn open_in_browser(url: String) -> Result<(), String> {
    log::info!("[AppControl] Opening {}", url);
    tokio::task::spawn_blocking(move || open::that(&url))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| format!("Failed to open browser: {}", e))
}

pub async fn get_quick_links() -> Result<Vec<QuickLink>, String> {
    Ok(QUICK_LINKS.to_vec())
}

pub async fn open_quick_link(name: String) -> Result<QuickLink, String> {
    let link = find_quick_link(&name).ok_or_else(|| format!("Unknown link: {}", name.trim()))?;
    open_in_browser(link.url.to_string()).await?;
    Ok(link)
}

pub async fn web_search(query: String) -> Result<String, String> {
    let url = search_url(&query)?;
    open_in_browser(url.to_string()).await?;
    Ok(url.into())
}
