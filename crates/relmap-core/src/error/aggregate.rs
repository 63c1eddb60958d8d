use super::Error;

/// Several independent failures found during a single pass.
///
/// Association merging and model validation keep going after the first
/// failure so that every offending name is reported at once.
#[derive(Debug)]
pub(super) struct AggregateError {
    errors: Box<[Error]>,
}

impl std::error::Error for AggregateError {}

impl core::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{} errors occurred", self.errors.len())?;

        for err in self.errors.iter() {
            write!(f, "; {err}")?;
        }

        Ok(())
    }
}

impl Error {
    /// Turns a list of collected failures into a result.
    ///
    /// An empty list is `Ok`, a single failure is returned as is and several
    /// failures are wrapped into one aggregate error.
    pub fn aggregate(errors: Vec<Error>) -> crate::Result<()> {
        let mut flattened = Vec::with_capacity(errors.len());

        for err in errors {
            match err.kind() {
                super::ErrorKind::Aggregate(aggregate) => {
                    flattened.extend(aggregate.errors.iter().cloned())
                }
                _ => flattened.push(err),
            }
        }

        match flattened.len() {
            0 => Ok(()),
            1 => Err(flattened.remove(0)),
            _ => Err(Error::from(super::ErrorKind::Aggregate(AggregateError {
                errors: flattened.into(),
            }))),
        }
    }

    /// Returns the individual failures carried by this error.
    ///
    /// For an aggregate this is each collected failure, otherwise it is the
    /// error itself.
    pub fn errors(&self) -> impl Iterator<Item = &Error> + '_ {
        let errors: &[Error] = match self.kind() {
            super::ErrorKind::Aggregate(aggregate) => &aggregate.errors,
            _ => core::slice::from_ref(self),
        };

        errors.iter()
    }

    /// Returns `true` if this error aggregates several failures.
    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Aggregate(_))
    }
}
