//! Closed enumerations for frame types and acknowledgement codes (§6).

/// The closed set of wire frame type codes.
///
/// `Unknown` preserves the original token for frames outside the closed set
/// so decode never fails on an unrecognized TYPE — only on an unparseable
/// frame shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PacketType {
    Login,
    LoginResponse,
    ShortData,
    ShortDataResponse,
    ExtendedData,
    ExtendedDataResponse,
    BlackboxBatch,
    BlackboxResponse,
    Ping,
    PingResponse,
    DriverMessage,
    DriverMessageResponse,
    VideoStreamQuery,
    VideoStream,
    VideoRecordQuery,
    VideoRecord,
    VideoStreamStopQuery,
    VideoStreamStop,
    VideoFileQuery,
    VideoFile,
    VideoFileListQuery,
    VideoFileListResponse,
    ImageQuery,
    Image,
    ImageResponse,
    DddQuery,
    DddInfo,
    DddInfoResponse,
    Ddd,
    DddResponse,
    UploadSoftware,
    UploadConfiguration,
    Unknown(String),
}

impl PacketType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Login => "L",
            Self::LoginResponse => "AL",
            Self::ShortData => "SD",
            Self::ShortDataResponse => "ASD",
            Self::ExtendedData => "D",
            Self::ExtendedDataResponse => "AD",
            Self::BlackboxBatch => "B",
            Self::BlackboxResponse => "AB",
            Self::Ping => "P",
            Self::PingResponse => "AP",
            Self::DriverMessage => "M",
            Self::DriverMessageResponse => "AM",
            Self::VideoStreamQuery => "QLV",
            Self::VideoStream => "LV",
            Self::VideoRecordQuery => "QPB",
            Self::VideoRecord => "PB",
            Self::VideoStreamStopQuery => "QVS",
            Self::VideoStreamStop => "VS",
            Self::VideoFileQuery => "QVF",
            Self::VideoFile => "VF",
            Self::VideoFileListQuery => "QTM",
            Self::VideoFileListResponse => "TM",
            Self::ImageQuery => "QI",
            Self::Image => "I",
            Self::ImageResponse => "AI",
            Self::DddQuery => "QT",
            Self::DddInfo => "IT",
            Self::DddInfoResponse => "AIT",
            Self::Ddd => "T",
            Self::DddResponse => "AT",
            Self::UploadSoftware => "US",
            Self::UploadConfiguration => "UC",
            Self::Unknown(s) => s,
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "L" => Self::Login,
            "AL" => Self::LoginResponse,
            "SD" => Self::ShortData,
            "ASD" => Self::ShortDataResponse,
            "D" => Self::ExtendedData,
            "AD" => Self::ExtendedDataResponse,
            "B" => Self::BlackboxBatch,
            "AB" => Self::BlackboxResponse,
            "P" => Self::Ping,
            "AP" => Self::PingResponse,
            "M" => Self::DriverMessage,
            "AM" => Self::DriverMessageResponse,
            "QLV" => Self::VideoStreamQuery,
            "LV" => Self::VideoStream,
            "QPB" => Self::VideoRecordQuery,
            "PB" => Self::VideoRecord,
            "QVS" => Self::VideoStreamStopQuery,
            "VS" => Self::VideoStreamStop,
            "QVF" => Self::VideoFileQuery,
            "VF" => Self::VideoFile,
            "QTM" => Self::VideoFileListQuery,
            "TM" => Self::VideoFileListResponse,
            "QI" => Self::ImageQuery,
            "I" => Self::Image,
            "AI" => Self::ImageResponse,
            "QT" => Self::DddQuery,
            "IT" => Self::DddInfo,
            "AIT" => Self::DddInfoResponse,
            "T" => Self::Ddd,
            "AT" => Self::DddResponse,
            "US" => Self::UploadSoftware,
            "UC" => Self::UploadConfiguration,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// `AL#<code>` — login acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginResponseCode {
    Ok,
    Rejected,
    AuthError,
    CrcError,
}

impl LoginResponseCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "1",
            Self::Rejected => "0",
            Self::AuthError => "01",
            Self::CrcError => "10",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Self::Ok),
            "0" => Some(Self::Rejected),
            "01" => Some(Self::AuthError),
            "10" => Some(Self::CrcError),
            _ => None,
        }
    }
}

/// `AD#<code>` — extended-data acknowledgement, with an optional `.n` subcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedDataResponseCode {
    StructError,
    InvalidTimestamp,
    Ok,
    CoordinateError,
    MovePropsError,
    SatsError,
    IoPropsError,
    AdcPropsError,
    ParamsError,
    ParamNameLenError,
    ParamNameError,
    CrcError,
}

impl ExtendedDataResponseCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StructError => "-1",
            Self::InvalidTimestamp => "0",
            Self::Ok => "1",
            Self::CoordinateError => "10",
            Self::MovePropsError => "11",
            Self::SatsError => "12",
            Self::IoPropsError => "13",
            Self::AdcPropsError => "14",
            Self::ParamsError => "15",
            Self::ParamNameLenError => "15.1",
            Self::ParamNameError => "15.2",
            Self::CrcError => "16",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "-1" => Some(Self::StructError),
            "0" => Some(Self::InvalidTimestamp),
            "1" => Some(Self::Ok),
            "10" => Some(Self::CoordinateError),
            "11" => Some(Self::MovePropsError),
            "12" => Some(Self::SatsError),
            "13" => Some(Self::IoPropsError),
            "14" => Some(Self::AdcPropsError),
            "15" => Some(Self::ParamsError),
            "15.1" => Some(Self::ParamNameLenError),
            "15.2" => Some(Self::ParamNameError),
            "16" => Some(Self::CrcError),
            _ => None,
        }
    }
}

/// `ASD#<code>` — short-data acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortDataResponseCode {
    StructError,
    InvalidTimestamp,
    Ok,
    CoordinateError,
    MovePropsError,
    SatsError,
    CrcError,
}

impl ShortDataResponseCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StructError => "-1",
            Self::InvalidTimestamp => "0",
            Self::Ok => "1",
            Self::CoordinateError => "10",
            Self::MovePropsError => "11",
            Self::SatsError => "12",
            Self::CrcError => "13",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "-1" => Some(Self::StructError),
            "0" => Some(Self::InvalidTimestamp),
            "1" => Some(Self::Ok),
            "10" => Some(Self::CoordinateError),
            "11" => Some(Self::MovePropsError),
            "12" => Some(Self::SatsError),
            "13" => Some(Self::CrcError),
            _ => None,
        }
    }
}
