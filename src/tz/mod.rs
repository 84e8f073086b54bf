/*!
Expansion of a zone's segments and rules into UTC transitions.

A [`Transition`] is a moment at which the UTC offset (or the abbreviation,
or the amount of daylight saving) of a zone changes. [`expand`] computes
every transition of a zone over a range of years, in chronological order.
*/

pub use self::{expand::expand, transition::Transition};

mod expand;
mod transition;
