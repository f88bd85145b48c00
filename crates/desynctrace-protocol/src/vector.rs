use std::fmt;
use std::time::Duration;

use strum_macros::{Display, EnumIter, EnumString};

use crate::request::Request;
use crate::response::Response;

/// The seven desync classes this scanner knows about. Closed: a new vector
/// does not add a category, it picks an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum VectorCategory {
    #[strum(serialize = "CL.TE")]
    ClTe,
    #[strum(serialize = "TE.CL")]
    TeCl,
    #[strum(serialize = "TE.TE")]
    TeTe,
    #[strum(serialize = "CL.0")]
    Cl0,
    #[strum(serialize = "H2.CL")]
    H2Cl,
    #[strum(serialize = "H2.TE")]
    H2Te,
    #[strum(serialize = "H2.CRLF")]
    H2Crlf,
}

/// One or more base requests a vector would like to send; `generate` builds
/// these from a plain baseline request (method/url/host already filled in).
pub type PayloadGenerator = fn(&Request) -> Vec<Request>;

/// Weak, fast suspicion check over a single response. `baseline` is the
/// fingerprint probe's duration, when one is available; vectors use it for
/// the "duration > baseline * 5" arm and treat its absence as "that arm never
/// fires".
pub type ResponsePredicate = fn(&Response, Option<Duration>) -> bool;

/// An immutable attack vector: a payload factory plus the weak response
/// predicate used only for the blind detector's fast path (the real verdict
/// comes from the poisoning detector).
#[derive(Clone, Copy)]
pub struct Vector {
    pub code: &'static str,
    pub name: &'static str,
    pub category: VectorCategory,
    pub generate: PayloadGenerator,
    pub verify: ResponsePredicate,
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

impl Vector {
    pub fn payloads(&self, base: &Request) -> Vec<Request> {
        (self.generate)(base)
    }

    pub fn is_suspicious(&self, response: &Response, baseline: Option<Duration>) -> bool {
        (self.verify)(response, baseline)
    }
}
