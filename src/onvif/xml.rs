//! Namespace-agnostic XML helpers for ONVIF SOAP responses
//!
//! Devices disagree on namespace prefixes (`tt:`, `tds:`, `trt:`, bare), so
//! elements are matched by local name only.

/// Extract XAddr from capability section
pub fn extract_capability_xaddr(xml: &str, capability: &str) -> Option<String> {
    // Look for pattern like <tt:PTZ><tt:XAddr>http://...</tt:XAddr>
    let cap_patterns = [format!("<{}>", capability), format!(":{}>", capability)];

    for pattern in &cap_patterns {
        if let Some(cap_start) = xml.find(pattern.as_str()) {
            let cap_section = &xml[cap_start..];
            let end_pattern = format!("</{}", capability);
            let section = match cap_section.find(end_pattern.as_str()) {
                Some(end_idx) => &cap_section[..end_idx],
                None => cap_section,
            };
            if let Some(xaddr) = extract_xml_value(section, "XAddr") {
                return Some(xaddr);
            }
        }
    }
    None
}

/// Extract XML value with namespace-agnostic matching
pub fn extract_xml_value(xml: &str, tag: &str) -> Option<String> {
    // Try with common ONVIF namespace prefix first
    let prefixed_patterns = [format!("<tds:{}>", tag), format!("<tt:{}>", tag)];

    for pattern in &prefixed_patterns {
        if let Some(start) = xml.find(pattern.as_str()) {
            let content_start = start + pattern.len();
            if let Some(end) = xml[content_start..].find("</") {
                let value = xml[content_start..content_start + end].trim().to_string();
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
    }

    // Any prefix, attributes allowed
    element_text(xml, tag)
}

/// Text content of the first element whose local name is `tag`
pub fn element_text(xml: &str, tag: &str) -> Option<String> {
    let (start, _) = find_open_tag(xml, tag)?;
    let after = &xml[start..];
    let open_end = after.find('>')?;
    if after[..open_end].ends_with('/') {
        return None;
    }
    let content = &after[open_end + 1..];
    let end = content.find("</")?;
    let value = content[..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// All elements whose local name is `tag`, each including its own tags
pub fn extract_elements(xml: &str, tag: &str) -> Vec<String> {
    let mut elements = Vec::new();
    let mut pos = 0;

    while let Some((start, name)) = find_open_tag(&xml[pos..], tag) {
        let abs_start = pos + start;
        let Some(open_end) = xml[abs_start..].find('>') else {
            break;
        };
        let open_tag = &xml[abs_start..abs_start + open_end + 1];

        if open_tag.ends_with("/>") {
            elements.push(open_tag.to_string());
            pos = abs_start + open_tag.len();
            continue;
        }

        let close = format!("</{}>", name);
        match xml[abs_start..].find(close.as_str()) {
            Some(end) => {
                let stop = abs_start + end + close.len();
                elements.push(xml[abs_start..stop].to_string());
                pos = stop;
            }
            None => break,
        }
    }

    elements
}

/// Attribute value on the opening tag of an element string
pub fn opening_tag_attribute(element: &str, attr: &str) -> Option<String> {
    let open_end = element.find('>')?;
    let tag = &element[..open_end];

    tag.match_indices(attr).find_map(|(start, _)| {
        // Attribute names follow whitespace (space, tab or newline)
        if !tag[..start].ends_with(char::is_whitespace) {
            return None;
        }
        let after = tag[start + attr.len()..].trim_start();
        let after = after.strip_prefix('=')?.trim_start();
        let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let value = &after[1..];
        let end = value.find(quote)?;
        Some(value[..end].to_string())
    })
}

/// Locate `<prefix:tag` or `<tag` followed by whitespace, `>` or `/`
fn find_open_tag(xml: &str, tag: &str) -> Option<(usize, String)> {
    let mut pos = 0;
    while let Some(lt) = xml[pos..].find('<') {
        let start = pos + lt;
        let rest = &xml[start + 1..];
        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        let local = name.rsplit(':').next().unwrap_or(name);
        if !name.is_empty() && local == tag {
            return Some((start, name.to_string()));
        }
        pos = start + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILES: &str = r#"<SOAP-ENV:Body><trt:GetProfilesResponse>
<trt:Profiles token="profile_1" fixed="true"><tt:Name>mainStream</tt:Name>
<tt:VideoSourceConfiguration token="vsconf"><tt:Name>VideoSourceConfig</tt:Name></tt:VideoSourceConfiguration>
</trt:Profiles>
<trt:Profiles token='profile_2'><tt:Name>minorStream</tt:Name></trt:Profiles>
</trt:GetProfilesResponse></SOAP-ENV:Body>"#;

    #[test]
    fn test_extract_elements_by_local_name() {
        let profiles = extract_elements(PROFILES, "Profiles");
        assert_eq!(profiles.len(), 2);
        assert_eq!(opening_tag_attribute(&profiles[0], "token").as_deref(), Some("profile_1"));
        assert_eq!(opening_tag_attribute(&profiles[1], "token").as_deref(), Some("profile_2"));
        assert_eq!(extract_xml_value(&profiles[0], "Name").as_deref(), Some("mainStream"));
        assert_eq!(extract_xml_value(&profiles[1], "Name").as_deref(), Some("minorStream"));
    }

    #[test]
    fn test_attribute_after_any_whitespace() {
        let element = "<trt:Profiles\n\ttoken=\"p1\" fixed=\"true\"><tt:Name>a</tt:Name></trt:Profiles>";
        assert_eq!(opening_tag_attribute(element, "token").as_deref(), Some("p1"));
        assert_eq!(opening_tag_attribute(element, "fixed").as_deref(), Some("true"));

        let spaced = "<tt:Preset\ttoken = 'home'/>";
        assert_eq!(opening_tag_attribute(spaced, "token").as_deref(), Some("home"));

        // Suffix matches are a different attribute
        let other = "<tt:Preset xtoken=\"nope\" token=\"yes\"/>";
        assert_eq!(opening_tag_attribute(other, "token").as_deref(), Some("yes"));
        assert_eq!(opening_tag_attribute("<tt:Preset xtoken=\"nope\"/>", "token"), None);
    }

    #[test]
    fn test_self_closing_element() {
        let xml = r#"<a><tptz:Preset token="p1"/><tptz:Preset token="p2"><tt:Name>Door</tt:Name></tptz:Preset></a>"#;
        let presets = extract_elements(xml, "Preset");
        assert_eq!(presets.len(), 2);
        assert_eq!(opening_tag_attribute(&presets[0], "token").as_deref(), Some("p1"));
        assert_eq!(element_text(&presets[0], "Name"), None);
        assert_eq!(element_text(&presets[1], "Name").as_deref(), Some("Door"));
    }

    #[test]
    fn test_element_text_with_attributes() {
        let xml = r#"<s:Fault><s:Reason><s:Text xml:lang="en">Sender not Authorized</s:Text></s:Reason></s:Fault>"#;
        assert_eq!(element_text(xml, "Text").as_deref(), Some("Sender not Authorized"));
    }

    #[test]
    fn test_extract_capability_xaddr() {
        let xml = r#"<tds:Capabilities>
<tt:Device><tt:XAddr>http://10.0.0.5/onvif/device_service</tt:XAddr></tt:Device>
<tt:Media><tt:XAddr>http://10.0.0.5/onvif/media_service</tt:XAddr></tt:Media>
<tt:PTZ><tt:XAddr>http://10.0.0.5/onvif/ptz_service</tt:XAddr></tt:PTZ>
</tds:Capabilities>"#;
        assert_eq!(
            extract_capability_xaddr(xml, "Media").as_deref(),
            Some("http://10.0.0.5/onvif/media_service")
        );
        assert_eq!(
            extract_capability_xaddr(xml, "PTZ").as_deref(),
            Some("http://10.0.0.5/onvif/ptz_service")
        );
        assert_eq!(extract_capability_xaddr(xml, "Imaging"), None);
    }
}
