use crate::{
    civil::DateTime,
    zic::{Rule, ZoneSegment},
};

/// A change of UTC offset, abbreviation or daylight saving in a zone.
///
/// A transition is either driven by a rule (one yearly occurrence of a
/// `Rule` line) or synthesized at the start of a zone segment.
#[derive(Clone, Copy, Debug)]
pub struct Transition<'z> {
    pub(crate) at: DateTime,
    pub(crate) offset_before: i32,
    pub(crate) offset_after: i32,
    pub(crate) save: i32,
    pub(crate) letters: &'z str,
    pub(crate) segment: &'z ZoneSegment,
    pub(crate) segment_index: usize,
    pub(crate) rule: Option<(&'z Rule, i32)>,
}

impl<'z> Transition<'z> {
    /// The instant of this transition, in UTC.
    pub fn at(&self) -> DateTime {
        self.at
    }

    /// The instant of this transition as a local date-time in the offset in
    /// effect before it.
    pub fn local(&self) -> DateTime {
        self.at.add_seconds(i64::from(self.offset_before)).with_utc(false)
    }

    /// The UTC offset in effect before this transition, in seconds.
    pub fn offset_before(&self) -> i32 {
        self.offset_before
    }

    /// The UTC offset in effect after this transition, in seconds.
    pub fn offset_after(&self) -> i32 {
        self.offset_after
    }

    /// The amount of daylight saving in effect after this transition. Zero
    /// means standard time.
    pub fn save(&self) -> i32 {
        self.save
    }

    /// The rule letters in effect after this transition.
    pub fn letters(&self) -> &'z str {
        self.letters
    }

    /// The abbreviation in effect after this transition.
    pub fn abbreviation(&self) -> String {
        self.segment.format().abbreviation(
            self.letters,
            self.save,
            self.offset_after,
        )
    }

    /// The zone segment this transition belongs to.
    pub fn segment(&self) -> &'z ZoneSegment {
        self.segment
    }

    /// The position of this transition's segment in its zone.
    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    /// The rule that caused this transition, or `None` for a transition at
    /// the start of a zone segment.
    pub fn rule(&self) -> Option<&'z Rule> {
        self.rule.map(|(rule, _)| rule)
    }

    /// The year of the rule occurrence that caused this transition.
    pub fn rule_year(&self) -> Option<i32> {
        self.rule.map(|(_, year)| year)
    }
}
