use http_client::Request;

/// Identifies the tool to Last.fm instead of posing as a browser
pub const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; lfcircle; https://github.com/markjoshwel/lfcircle)";

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Add the headers sent with every report page request
pub fn add_report_headers(request: &mut Request) {
    request.insert_header("User-Agent", USER_AGENT);
    request.insert_header("Accept", ACCEPT_HTML);
    request.insert_header("Accept-Language", "en-US,en;q=0.9");
    request.insert_header("DNT", "1");
    request.insert_header("Connection", "keep-alive");
}
