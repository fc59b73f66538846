//! Streaming quantile estimation backing [`Summary`](crate::metric::Summary).

mod ckms;
mod window;

pub(crate) use window::TimeWindowQuantiles;
