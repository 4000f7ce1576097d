//! Scripted in-memory [`PageSession`] and page fixtures for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::scrapers::error::ScrapeError;
use crate::scrapers::traits::PageSession;

/// What the fake session does for one navigation to a URL.
#[derive(Debug, Clone)]
pub enum Script {
    Renders(String),
    TimesOut,
}

type NavigateHook = Box<dyn Fn(&str) + Send>;

/// A [`PageSession`] that serves scripted outcomes instead of driving a
/// browser. Each URL holds a queue of outcomes consumed per visit; the last
/// outcome repeats once the queue is drained, so a single `TimesOut` means
/// "always times out". Unscripted URLs always time out.
#[derive(Default)]
pub struct FakeSession {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    current: Mutex<Option<Script>>,
    visits: Mutex<Vec<String>>,
    on_navigate: Mutex<Option<NavigateHook>>,
}

impl FakeSession {
    pub fn script(&self, url: &str, outcomes: Vec<Script>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), outcomes.into());
    }

    /// Run `hook` on every navigation, e.g. to cancel a token mid-run.
    pub fn on_navigate(&self, hook: impl Fn(&str) + Send + 'static) {
        *self.on_navigate.lock().unwrap() = Some(Box::new(hook));
    }

    /// How many times `url` has been navigated to.
    pub fn visit_count(&self, url: &str) -> usize {
        self.visits.lock().unwrap().iter().filter(|v| *v == url).count()
    }

    pub fn total_visits(&self) -> usize {
        self.visits.lock().unwrap().len()
    }
}

impl PageSession for FakeSession {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        self.visits.lock().unwrap().push(url.to_string());
        if let Some(hook) = &*self.on_navigate.lock().unwrap() {
            hook(url);
        }
        let mut scripts = self.scripts.lock().unwrap();
        let outcome = scripts.get_mut(url).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });
        *self.current.lock().unwrap() = outcome;
        Ok(())
    }

    fn wait_until_present(&self, _selector: &str, _timeout: Duration) -> Result<bool, ScrapeError> {
        Ok(matches!(
            *self.current.lock().unwrap(),
            Some(Script::Renders(_))
        ))
    }

    fn page_source(&self) -> Result<String, ScrapeError> {
        match &*self.current.lock().unwrap() {
            Some(Script::Renders(html)) => Ok(html.clone()),
            _ => Ok(String::new()),
        }
    }
}

/// A results page with one `article` card per `(data_href, recency_label)`.
pub fn results_page(cards: &[(&str, &str)]) -> String {
    let mut body = String::from("<html><body><div id=\"consentBanner\"></div>");
    for (href, label) in cards {
        body.push_str(&format!(
            "<article data-href=\"{href}\">\
             <div class=\"aditem-main--top--right\">{label}</div>\
             </article>"
        ));
    }
    body.push_str("</body></html>");
    body
}

/// A minimal but structurally complete advert page.
pub fn advert_page(title: &str, description: &str) -> String {
    format!(
        "<html><body>\n\
         <div id=\"viewad-extra-info\"><span>11.03.2022</span></div>\n\
         <div id=\"viewad-main-info\">\n\
         <h2 id=\"viewad-price\">123.000 &euro; VB</h2>\n\
         <span id=\"viewad-locality\">10115 Berlin</span>\n\
         </div>\n\
         <h1 id=\"viewad-title\">Anzeige\n{title}</h1>\n\
         <div id=\"viewad-details\"><ul>\n\
         <li>Wohnfl&auml;che\n120 m&sup2;</li>\n\
         <li>Zimmer\n5</li>\n\
         </ul></div>\n\
         <div id=\"viewad-description\">\
         <p id=\"viewad-description-text\">{description}</p>\
         </div>\n\
         </body></html>"
    )
}
