use crate::{
    civil::DateTime,
    error::{zic::Error, ErrorContext},
    zic::field::{self, DaySelector, RuleTime},
};

/// A single `Rule` line: a transition pattern that repeats yearly over a
/// range of years.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rule {
    name: String,
    from: i32,
    to: Option<i32>,
    month: i8,
    day: DaySelector,
    at: RuleTime,
    save: i32,
    letters: String,
}

impl Rule {
    /// Parses the fields of a `Rule` line, not including the `Rule` keyword:
    /// `NAME FROM TO - IN ON AT SAVE LETTER/S`.
    pub(crate) fn parse(fields: &[&str]) -> Result<Rule, crate::Error> {
        let &[name, from, to, _, month, day, at, save, letters] = fields
        else {
            let got = fields.len();
            return Err(Error::ExpectedRuleNineFields { got }.into());
        };
        if name.is_empty() {
            return Err(Error::ExpectedNonEmptyName.into());
        }
        let from =
            field::parse_year(from).context(Error::FailedParseFieldFrom)?;
        let to =
            field::parse_to_year(to, from).context(Error::FailedParseFieldTo)?;
        if let Some(end) = to {
            if from > end {
                return Err(Error::InvalidRuleYear { start: from, end }.into());
            }
        }
        let month =
            field::parse_month(month).context(Error::FailedParseFieldIn)?;
        let day = DaySelector::parse(day).context(Error::FailedParseFieldOn)?;
        let at = RuleTime::parse(at).context(Error::FailedParseFieldAt)?;
        let save =
            field::parse_save(save).context(Error::FailedParseFieldSave)?;
        let letters = if letters == "-" { "" } else { letters };
        Ok(Rule {
            name: name.to_string(),
            from,
            to,
            month,
            day,
            at,
            save,
            letters: letters.to_string(),
        })
    }

    /// The name of the rule set this rule belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The first year this rule applies to.
    pub fn from_year(&self) -> i32 {
        self.from
    }

    /// The last year this rule applies to, or `None` if it applies forever
    /// (`max`).
    pub fn to_year(&self) -> Option<i32> {
        self.to
    }

    /// Returns true if this rule applies to exactly one year.
    pub fn is_single_year(&self) -> bool {
        self.to == Some(self.from)
    }

    pub fn month(&self) -> i8 {
        self.month
    }

    pub fn day(&self) -> DaySelector {
        self.day
    }

    pub fn at(&self) -> RuleTime {
        self.at
    }

    /// The amount of daylight saving, in seconds, in effect after this rule
    /// fires. Zero means standard time.
    pub fn save(&self) -> i32 {
        self.save
    }

    /// The letters substituted for `%s` in a zone's format. Empty when the
    /// rule's `LETTER/S` field is `-`.
    pub fn letters(&self) -> &str {
        &self.letters
    }

    /// Returns the local date-time (measured in the mode of this rule's `AT`
    /// field) at which this rule fires in the given year.
    ///
    /// The year is not checked against this rule's range.
    pub fn nominal(&self, year: i32) -> DateTime {
        self.at.on(self.day.date_in(year, self.month))
    }

    /// Returns the number of days between the date this rule nominally
    /// fires on and the date of `local`.
    ///
    /// The nominal date is taken from whichever of the year of `local` and
    /// its neighbors is closest, so a transition that moved across a year
    /// boundary still yields a small shift.
    pub fn day_shift(&self, local: DateTime) -> i64 {
        let day = local.epoch_day();
        (local.year() - 1..=local.year() + 1)
            .map(|year| day - self.day.date_in(year, self.month).epoch_day())
            .min_by_key(|shift| shift.abs())
            .unwrap_or(0)
    }
}

/// One occurrence of a rule in a particular year.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RuleInstant<'r> {
    /// The rule that fires.
    pub rule: &'r Rule,
    /// The year the rule fires in.
    pub year: i32,
    /// The local date-time it fires at, measured in the mode of the rule's
    /// `AT` field.
    pub local: DateTime,
    /// The wall clock offset in effect afterwards, in seconds east of UTC.
    pub offset: i32,
}

impl<'r> RuleInstant<'r> {
    /// Converts this instant to UTC, given the wall clock and standard
    /// offsets in effect just before it.
    pub fn to_utc(&self, wall_offset: i32, std_offset: i32) -> DateTime {
        self.rule.at.mode.to_utc(self.local, wall_offset, std_offset)
    }
}

/// All of the rules sharing one name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RuleSet {
    name: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub(crate) fn new(name: &str) -> RuleSet {
        RuleSet { name: name.to_string(), rules: vec![] }
    }

    pub(crate) fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rules of this set, in the order they were defined.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the earliest rule in this set with no daylight saving.
    ///
    /// Its letters name standard time before any rule of the set has fired.
    pub fn first_standard_rule(&self) -> Option<&Rule> {
        self.rules
            .iter()
            .filter(|rule| rule.save == 0)
            .min_by_key(|rule| rule.from)
    }

    /// Expands every rule of this set for each year it applies to, up to but
    /// not including `max_year`.
    ///
    /// `std_offset` is the standard offset of the zone segment using this
    /// set. The offset of each returned instant is `std_offset` plus the
    /// rule's save. Instants are sorted by their local date-time. Expansion
    /// is a pure function of its inputs.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::zic::Database;
    ///
    /// let mut db = Database::new();
    /// db.parse("test", "\
    /// Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
    /// Rule US 2007 max - Nov Sun>=1 2:00 0 S
    /// ")?;
    /// let set = db.rule_set("US").unwrap();
    /// let instants = set.expand(-5 * 3600, 2009);
    /// let got: Vec<String> = instants
    ///     .iter()
    ///     .map(|i| format!("{} {}", i.local, i.offset))
    ///     .collect();
    /// assert_eq!(got, [
    ///     "20070311T020000 -14400",
    ///     "20071104T020000 -18000",
    ///     "20080309T020000 -14400",
    ///     "20081102T020000 -18000",
    /// ]);
    ///
    /// # Ok::<(), tzconvert::Error>(())
    /// ```
    pub fn expand(
        &self,
        std_offset: i32,
        max_year: i32,
    ) -> Vec<RuleInstant<'_>> {
        let mut instants = vec![];
        for rule in self.rules.iter() {
            let last = rule.to.unwrap_or(i32::MAX).min(max_year - 1);
            for year in rule.from..=last {
                instants.push(RuleInstant {
                    rule,
                    year,
                    local: rule.nominal(year),
                    offset: std_offset + rule.save,
                });
            }
        }
        instants.sort_by_key(|instant| instant.local);
        instants
    }
}
