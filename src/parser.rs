use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::RouteError;
use crate::gpx_types::*;
use crate::options::ParseOptions;

type Result<T> = std::result::Result<T, RouteError>;

/// Parse a GPX string into a ParsedRoute, tolerating malformed input.
///
/// - name: text of the first `<name>` anywhere in the document, raw
///   (entities are not unescaped), else "Unnamed Route"
/// - trackpoints: closed `<trkpt>` elements with their first `<ele>`; only
///   when there are none, every `<trkpt>` tag (self-closing or unclosed)
///   with coordinates only
/// - waypoints: closed `<wpt>` elements with their first `<name>`/`<type>`
///
/// Unparseable numbers become NaN. Point tags lacking lat or lon are
/// skipped. Child elements only count when closed inside their point, and
/// markup the tokenizer rejects is skipped up to the next `<`.
pub fn parse_gpx(xml: &str) -> ParsedRoute {
    parse_gpx_with(xml, &ParseOptions::default()).unwrap_or_else(|e| {
        warn!("tolerant GPX parse failed: {e}");
        ParsedRoute::default()
    })
}

/// Parse with explicit options. Only fails when `opts.strict` is set.
pub fn parse_gpx_with(xml: &str, opts: &ParseOptions) -> Result<ParsedRoute> {
    let mut scanner = Scanner::new(xml, opts.strict);
    scanner.run()?;
    Ok(scanner.finish())
}

fn reader_at(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
    reader
}

struct Scanner<'a> {
    xml: &'a str,
    reader: Reader<&'a [u8]>,
    /// offset of the reader's input within `xml`
    base: usize,
    strict: bool,
    name: Option<String>,
    /// <trkpt> elements that saw their end tag
    closed_trkpts: Vec<GeoPoint>,
    /// every <trkpt> tag, coordinates only
    trkpt_tags: Vec<GeoPoint>,
    waypoints: Vec<Waypoint>,
    open_trkpt: Option<GeoPoint>,
    open_wpt: Option<Waypoint>,
    // content offsets of child elements awaiting their end tag
    name_start: Option<usize>,
    wpt_name_start: Option<usize>,
    wpt_type_start: Option<usize>,
    ele_start: Option<usize>,
}

impl<'a> Scanner<'a> {
    fn new(xml: &'a str, strict: bool) -> Self {
        // the reader drops a BOM without counting it in its offsets
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        Self {
            xml,
            reader: reader_at(xml),
            base: 0,
            strict,
            name: None,
            closed_trkpts: Vec::new(),
            trkpt_tags: Vec::new(),
            waypoints: Vec::new(),
            open_trkpt: None,
            open_wpt: None,
            name_start: None,
            wpt_name_start: None,
            wpt_type_start: None,
            ele_start: None,
        }
    }

    fn run(&mut self) -> Result<()> {
        loop {
            let event_start = self.position();
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    if self.recover(e, event_start)? {
                        continue;
                    }
                    break;
                }
            };
            match event {
                Event::Start(e) | Event::Empty(e) if !is_tag(&e) => {
                    debug!("stray '<' at byte {event_start}");
                    if !self.restart_after(event_start) {
                        break;
                    }
                }
                Event::Start(e) => self.start(&e)?,
                Event::Empty(e) => self.empty(&e)?,
                Event::End(e) => self.end(e.local_name().as_ref(), event_start)?,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    /// Byte offset in `xml` where the next event begins.
    fn position(&self) -> usize {
        self.base + self.reader.buffer_position() as usize
    }

    fn start(&mut self, e: &BytesStart<'a>) -> Result<()> {
        let content_start = self.position();
        match e.local_name().as_ref() {
            b"trkpt" => {
                if let Some((lat, lng)) = self.coords(e, "trkpt")? {
                    self.trkpt_tags.push(GeoPoint::new(lat, lng));
                    // an unclosed <trkpt> swallows later ones up to the next </trkpt>
                    if self.open_trkpt.is_none() {
                        self.open_trkpt = Some(GeoPoint::new(lat, lng));
                        self.ele_start = None;
                    }
                }
            }
            b"wpt" => {
                if let Some((lat, lng)) = self.coords(e, "wpt")? {
                    if self.open_wpt.is_none() {
                        self.open_wpt = Some(Waypoint::new(lat, lng));
                        self.wpt_name_start = None;
                        self.wpt_type_start = None;
                    }
                }
            }
            b"ele" => {
                let wanted = self.open_trkpt.is_some_and(|pt| pt.ele.is_none());
                if wanted && self.ele_start.is_none() {
                    self.ele_start = Some(content_start);
                }
            }
            b"name" => {
                if self.name.is_none() && self.name_start.is_none() {
                    self.name_start = Some(content_start);
                }
                let wanted = self.open_wpt.as_ref().is_some_and(|w| w.name.is_none());
                if wanted && self.wpt_name_start.is_none() {
                    self.wpt_name_start = Some(content_start);
                }
            }
            b"type" => {
                let wanted = self.open_wpt.as_ref().is_some_and(|w| w.point_type.is_none());
                if wanted && self.wpt_type_start.is_none() {
                    self.wpt_type_start = Some(content_start);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn empty(&mut self, e: &BytesStart<'a>) -> Result<()> {
        match e.local_name().as_ref() {
            b"trkpt" => {
                if let Some((lat, lng)) = self.coords(e, "trkpt")? {
                    self.trkpt_tags.push(GeoPoint::new(lat, lng));
                }
            }
            b"wpt" => debug!("ignoring self-closing <wpt> without content"),
            _ => {}
        }
        Ok(())
    }

    /// `event_start` is the offset of the end tag, which closes the content.
    fn end(&mut self, local_name: &[u8], event_start: usize) -> Result<()> {
        match local_name {
            b"trkpt" => {
                if let Some(pt) = self.open_trkpt.take() {
                    self.closed_trkpts.push(pt);
                }
                self.ele_start = None;
            }
            b"wpt" => {
                if let Some(wpt) = self.open_wpt.take() {
                    self.waypoints.push(wpt);
                }
                self.wpt_name_start = None;
                self.wpt_type_start = None;
            }
            b"ele" => {
                if let Some(start) = self.ele_start.take() {
                    let text = self.content(start, event_start);
                    let ele = parse_number(text, "trkpt", "ele", self.strict)?;
                    if let Some(pt) = self.open_trkpt.as_mut() {
                        pt.ele = Some(ele);
                    }
                }
            }
            b"name" => {
                if let Some(start) = self.name_start.take() {
                    self.name = Some(self.content(start, event_start).to_string());
                }
                if let Some(start) = self.wpt_name_start.take() {
                    let text = self.content(start, event_start);
                    if let Some(wpt) = self.open_wpt.as_mut() {
                        wpt.name = Some(text.to_string());
                    }
                }
            }
            b"type" => {
                if let Some(start) = self.wpt_type_start.take() {
                    let text = self.content(start, event_start);
                    if let Some(wpt) = self.open_wpt.as_mut() {
                        wpt.point_type = Some(text.to_string());
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Raw document text between two offsets.
    fn content(&self, start: usize, end: usize) -> &'a str {
        let xml = self.xml;
        xml.get(start..end).unwrap_or_default()
    }

    /// Read lat/lon attributes. `None` means the tag is not a usable point.
    fn coords(&mut self, e: &BytesStart<'_>, element: &'static str) -> Result<Option<(f64, f64)>> {
        let mut lat: Option<f64> = None;
        let mut lon: Option<f64> = None;

        for attr_result in e.attributes() {
            let attr = match attr_result {
                Ok(attr) => attr,
                Err(err) if self.strict => return Err(RouteError::XmlParse(err.into())),
                Err(err) => {
                    warn!("skipping malformed attribute on <{element}>: {err}");
                    continue;
                }
            };
            let value = String::from_utf8_lossy(&attr.value);
            match attr.key.local_name().as_ref() {
                b"lat" if lat.is_none() => {
                    lat = Some(parse_number(&value, element, "lat", self.strict)?);
                }
                b"lon" if lon.is_none() => {
                    lon = Some(parse_number(&value, element, "lon", self.strict)?);
                }
                _ => {}
            }
        }

        match (lat, lon) {
            (Some(lat), Some(lon)) => Ok(Some((lat, lon))),
            (None, _) => self.missing(element, "lat"),
            (_, None) => self.missing(element, "lon"),
        }
    }

    fn missing(&self, element: &'static str, attribute: &'static str) -> Result<Option<(f64, f64)>> {
        if self.strict {
            return Err(RouteError::MissingAttribute { element, attribute });
        }
        debug!("skipping <{element}> without '{attribute}'");
        Ok(None)
    }

    /// Skip markup the tokenizer rejected. Returns `false` when nothing is
    /// left to scan.
    fn recover(&mut self, err: quick_xml::Error, event_start: usize) -> Result<bool> {
        if self.strict {
            return Err(RouteError::XmlParse(err));
        }
        warn!("skipping malformed markup at byte {event_start}: {err}");
        Ok(self.restart_after(event_start))
    }

    /// Restart the tokenizer at the first `<` after `offset`.
    fn restart_after(&mut self, offset: usize) -> bool {
        let xml = self.xml;
        let next = xml
            .as_bytes()
            .get(offset + 1..)
            .and_then(|rest| rest.iter().position(|&b| b == b'<'))
            .map(|i| offset + 1 + i);

        match next {
            Some(next) => {
                self.reader = reader_at(&xml[next..]);
                self.base = next;
                true
            }
            None => {
                debug!("nothing left to scan after byte {offset}");
                false
            }
        }
    }

    fn finish(self) -> ParsedRoute {
        let trackpoints = if self.closed_trkpts.is_empty() {
            if !self.trkpt_tags.is_empty() {
                debug!(
                    "no closed <trkpt> elements, using {} bare tags",
                    self.trkpt_tags.len()
                );
            }
            self.trkpt_tags
        } else {
            self.closed_trkpts
        };

        let route = ParsedRoute {
            name: self
                .name
                .unwrap_or_else(|| DEFAULT_ROUTE_NAME.to_string()),
            trackpoints,
            waypoints: self.waypoints,
        };
        debug!(
            "parsed route '{}': {} trackpoints, {} waypoints",
            route.name,
            route.trackpoints.len(),
            route.waypoints.len()
        );
        route
    }
}

/// A `<` in text reads as a tag with an empty or `<`-bearing name.
fn is_tag(e: &BytesStart<'_>) -> bool {
    let name = e.name();
    let name = name.as_ref();
    let starts_ok = name
        .first()
        .is_some_and(|&b| b.is_ascii_alphabetic() || b == b'_' || b == b':' || b >= 0x80);
    starts_ok && !name.contains(&b'<')
}

/// Parse numeric text, yielding NaN for garbage unless `strict`.
fn parse_number(raw: &str, element: &'static str, field: &'static str, strict: bool) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) if strict => Err(RouteError::InvalidNumber {
            element,
            field,
            value: raw.to_string(),
        }),
        Err(_) => {
            warn!("invalid {field} '{raw}' on <{element}>, using NaN");
            Ok(f64::NAN)
        }
    }
}
