//! The seven built-in desync vectors. Each submodule is a self-contained
//! payload factory plus a response predicate; [`all`] is the only thing a
//! detector needs to drive the whole library.
//!
//! Adding a vector means adding a module and an entry in [`all`] — detectors
//! and the transport never change.

mod cl0;
mod cl_te;
mod common;
mod h2_cl;
mod h2_crlf;
mod h2_te;
mod te_cl;
mod te_te;

use desynctrace_protocol::{Vector, VectorCategory};

/// Every vector this build knows about, in a stable order.
pub fn all() -> Vec<Vector> {
    vec![
        Vector {
            code: "CL.TE",
            name: "Content-Length / Transfer-Encoding desync",
            category: VectorCategory::ClTe,
            generate: cl_te::generate,
            verify: cl_te::verify,
        },
        Vector {
            code: "TE.CL",
            name: "Transfer-Encoding / Content-Length desync",
            category: VectorCategory::TeCl,
            generate: te_cl::generate,
            verify: te_cl::verify,
        },
        Vector {
            code: "TE.TE",
            name: "Transfer-Encoding obfuscation desync",
            category: VectorCategory::TeTe,
            generate: te_te::generate,
            verify: te_te::verify,
        },
        Vector {
            code: "CL.0",
            name: "Content-Length ignored on static route",
            category: VectorCategory::Cl0,
            generate: cl0::generate,
            verify: cl0::verify,
        },
        Vector {
            code: "H2.CL",
            name: "HTTP/2 content-length 0 with non-empty body",
            category: VectorCategory::H2Cl,
            generate: h2_cl::generate,
            verify: h2_cl::verify,
        },
        Vector {
            code: "H2.TE",
            name: "HTTP/2 forbidden transfer-encoding header",
            category: VectorCategory::H2Te,
            generate: h2_te::generate,
            verify: h2_te::verify,
        },
        Vector {
            code: "H2.CRLF",
            name: "HTTP/2 embedded CRLF in header value",
            category: VectorCategory::H2Crlf,
            generate: h2_crlf::generate,
            verify: h2_crlf::verify,
        },
    ]
}
