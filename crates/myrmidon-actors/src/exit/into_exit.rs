use std::convert::Infallible;

use myrmidon_utils::std_error_pp::ErrorPP;

use crate::exit::ExitReason;
use crate::imports::BoxError;

impl From<()> for ExitReason {
    fn from((): ()) -> Self {
        Self::normal()
    }
}

impl From<Infallible> for ExitReason {
    fn from(infallible: Infallible) -> Self {
        match infallible {}
    }
}

impl From<BoxError> for ExitReason {
    fn from(e: BoxError) -> Self {
        Self::Custom(ErrorPP::of(&*e).to_string().into())
    }
}

impl<IntoExit> From<Option<IntoExit>> for ExitReason
where
    IntoExit: Into<ExitReason>,
{
    fn from(option: Option<IntoExit>) -> Self {
        option.map(Into::into).unwrap_or_else(Self::normal)
    }
}

impl<IntoExit1, IntoExit2> From<Result<IntoExit1, IntoExit2>> for ExitReason
where
    IntoExit1: Into<ExitReason>,
    IntoExit2: Into<ExitReason>,
{
    fn from(result: Result<IntoExit1, IntoExit2>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(value) => value.into(),
        }
    }
}
